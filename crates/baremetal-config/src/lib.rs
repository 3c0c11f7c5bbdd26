//! Baremetal Deployment Configuration
//!
//! Pure derivation of the metal3 deployment parameters from a
//! [`ProvisioningSpec`]. Every parameter is independently optional: when its
//! source fields are missing (or unusable, such as an unparsable CIDR) the
//! parameter is absent, never an empty string.
//!
//! # Example
//!
//! ```
//! use baremetal_config::{DeploymentParameter, DerivedConfig};
//! use crds::ProvisioningSpec;
//!
//! let spec = ProvisioningSpec {
//!     provisioning_ip: "172.30.20.3".to_string(),
//!     provisioning_network_cidr: "172.30.20.0/24".to_string(),
//!     ..Default::default()
//! };
//! let derived = DerivedConfig::from_spec(&spec);
//! assert_eq!(derived.get(DeploymentParameter::ProvisioningIp), Some("172.30.20.3/24"));
//! assert_eq!(derived.lookup("HTTP_PORT"), Some("6180"));
//! assert_eq!(derived.lookup("CACHEURL"), None);
//! ```

pub mod cidr;
pub mod parameter;

pub use parameter::*;

use crds::ProvisioningSpec;

/// Port serving the agent and OS images.
pub const HTTP_PORT: &str = "6180";
/// Ironic API port.
pub const IRONIC_PORT: &str = "6385";
/// Ironic inspector API port.
pub const IRONIC_INSPECTOR_PORT: &str = "5050";

pub(crate) const KERNEL_URL_SUBPATH: &str = "images/ironic-python-agent.kernel";
pub(crate) const RAMDISK_URL_SUBPATH: &str = "images/ironic-python-agent.initramfs";
pub(crate) const IRONIC_ENDPOINT_SUBPATH: &str = "v1/";

/// The full parameter set derived from one specification, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedConfig {
    values: Vec<(DeploymentParameter, Option<String>)>,
}

impl DerivedConfig {
    /// Evaluates every [`DeploymentParameter`] against `spec`.
    pub fn from_spec(spec: &ProvisioningSpec) -> Self {
        let values = DeploymentParameter::ALL
            .iter()
            .map(|param| (*param, param.derive(spec)))
            .collect();
        Self { values }
    }

    pub fn get(&self, param: DeploymentParameter) -> Option<&str> {
        self.values
            .iter()
            .find(|(p, _)| *p == param)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Lookup by environment name. Unknown names are absent.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        DeploymentParameter::from_name(name).and_then(|param| self.get(param))
    }

    /// Present parameters as `(env name, value)` pairs, in table order.
    pub fn env_vars(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.values
            .iter()
            .filter_map(|(param, value)| value.as_deref().map(|v| (param.env_name(), v)))
    }
}

/// Derives a single parameter by its environment name.
///
/// Returns `None` for names outside the known parameter set.
pub fn lookup(name: &str, spec: &ProvisioningSpec) -> Option<String> {
    DeploymentParameter::from_name(name).and_then(|param| param.derive(spec))
}
