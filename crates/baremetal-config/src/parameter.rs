//! Deployment parameters and their derivation rules.

use crate::cidr::prefix_length;
use crate::{
    HTTP_PORT, IRONIC_ENDPOINT_SUBPATH, IRONIC_INSPECTOR_PORT, IRONIC_PORT, KERNEL_URL_SUBPATH,
    RAMDISK_URL_SUBPATH,
};
use crds::ProvisioningSpec;
use std::fmt;

/// A parameter handed to the metal3 deployment as an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentParameter {
    /// Provisioning IP with the network's prefix length, `ip/prefix`
    ProvisioningIp,
    ProvisioningInterface,
    DeployKernelUrl,
    DeployRamdiskUrl,
    IronicEndpoint,
    IronicInspectorEndpoint,
    /// Always present
    HttpPort,
    DhcpRange,
    RhcosImageUrl,
}

impl DeploymentParameter {
    pub const ALL: [DeploymentParameter; 9] = [
        DeploymentParameter::ProvisioningIp,
        DeploymentParameter::ProvisioningInterface,
        DeploymentParameter::DeployKernelUrl,
        DeploymentParameter::DeployRamdiskUrl,
        DeploymentParameter::IronicEndpoint,
        DeploymentParameter::IronicInspectorEndpoint,
        DeploymentParameter::HttpPort,
        DeploymentParameter::DhcpRange,
        DeploymentParameter::RhcosImageUrl,
    ];

    pub fn env_name(self) -> &'static str {
        match self {
            Self::ProvisioningIp => "PROVISIONING_IP",
            Self::ProvisioningInterface => "PROVISIONING_INTERFACE",
            Self::DeployKernelUrl => "DEPLOY_KERNEL_URL",
            Self::DeployRamdiskUrl => "DEPLOY_RAMDISK_URL",
            Self::IronicEndpoint => "IRONIC_ENDPOINT",
            Self::IronicInspectorEndpoint => "IRONIC_INSPECTOR_ENDPOINT",
            Self::HttpPort => "HTTP_PORT",
            Self::DhcpRange => "DHCP_RANGE",
            Self::RhcosImageUrl => "RHCOS_IMAGE_URL",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.env_name() == name)
    }

    /// Computes this parameter from `spec`, or `None` when its inputs are
    /// missing or unusable.
    pub fn derive(self, spec: &ProvisioningSpec) -> Option<String> {
        match self {
            Self::ProvisioningIp => provisioning_ip_cidr(spec),
            Self::ProvisioningInterface => non_empty(&spec.provisioning_interface),
            Self::DeployKernelUrl => provisioning_url(spec, HTTP_PORT, KERNEL_URL_SUBPATH),
            Self::DeployRamdiskUrl => provisioning_url(spec, HTTP_PORT, RAMDISK_URL_SUBPATH),
            Self::IronicEndpoint => provisioning_url(spec, IRONIC_PORT, IRONIC_ENDPOINT_SUBPATH),
            Self::IronicInspectorEndpoint => {
                provisioning_url(spec, IRONIC_INSPECTOR_PORT, IRONIC_ENDPOINT_SUBPATH)
            }
            Self::HttpPort => Some(HTTP_PORT.to_string()),
            // provisioningDHCPExternal is not consulted here
            Self::DhcpRange => non_empty(&spec.provisioning_dhcp_range),
            Self::RhcosImageUrl => non_empty(&spec.provisioning_os_download_url),
        }
    }
}

impl fmt::Display for DeploymentParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_name())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn provisioning_ip_cidr(spec: &ProvisioningSpec) -> Option<String> {
    if spec.provisioning_ip.is_empty() {
        return None;
    }
    let prefix = prefix_length(&spec.provisioning_network_cidr)?;
    Some(format!("{}/{}", spec.provisioning_ip, prefix))
}

fn provisioning_url(spec: &ProvisioningSpec, port: &str, path: &str) -> Option<String> {
    if spec.provisioning_ip.is_empty() {
        return None;
    }
    Some(format!("http://{}/{}", join_host_port(&spec.provisioning_ip, port), path))
}

/// `host:port`, bracketing hosts that contain a colon (IPv6 literals).
fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_lookup() {
        for param in DeploymentParameter::ALL {
            assert_eq!(DeploymentParameter::from_name(param.env_name()), Some(param));
        }
        assert_eq!(DeploymentParameter::from_name("provisioning_ip"), None);
    }

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("10.0.0.1", "80"), "10.0.0.1:80");
        assert_eq!(join_host_port("fd00::1", "80"), "[fd00::1]:80");
        assert_eq!(join_host_port("metal3.local", "80"), "metal3.local:80");
    }
}
