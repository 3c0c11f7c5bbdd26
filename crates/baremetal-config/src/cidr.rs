//! Minimal CIDR handling for the provisioning network.

use std::net::IpAddr;

/// Returns the prefix length of `cidr` (`addr/len`), or `None` when it does
/// not parse or the length is out of range for the address family.
pub fn prefix_length(cidr: &str) -> Option<u8> {
    let (addr, len) = cidr.split_once('/')?;
    let addr: IpAddr = addr.parse().ok()?;
    // reject signs and whitespace that u8 parsing would otherwise accept
    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let len: u8 = len.parse().ok()?;
    let max = match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    (len <= max).then_some(len)
}
