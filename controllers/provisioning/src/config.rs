//! Operator configuration loaded from the process environment.

use crate::error::ControllerError;
use std::env;
use std::net::SocketAddr;

/// Namespace holding the managed Secret and Deployment unless overridden.
pub const DEFAULT_TARGET_NAMESPACE: &str = "openshift-baremetal";
/// Operand version reported when neither version variable is set.
pub const DEFAULT_OPERATOR_VERSION: &str = "0.0.1-snapshot";
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Container images for each role in the metal3 deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaremetalImages {
    pub baremetal_operator: String,
    pub ironic: String,
    pub ironic_inspector: String,
    pub ironic_ipa_downloader: String,
    pub ironic_machine_os_downloader: String,
    pub ironic_static_ip_manager: String,
}

impl BaremetalImages {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let mut missing = Vec::new();
        let mut require = |var: &'static str| {
            non_empty(lookup(var)).unwrap_or_else(|| {
                missing.push(var);
                String::new()
            })
        };

        let images = Self {
            baremetal_operator: require("BAREMETAL_IMAGE"),
            ironic: require("IRONIC_IMAGE"),
            ironic_inspector: require("IRONIC_INSPECTOR_IMAGE"),
            ironic_ipa_downloader: require("IRONIC_IPA_DOWNLOADER_IMAGE"),
            ironic_machine_os_downloader: require("IRONIC_MACHINE_OS_DOWNLOADER_IMAGE"),
            ironic_static_ip_manager: require("IRONIC_STATIC_IP_MANAGER_IMAGE"),
        };

        if missing.is_empty() {
            Ok(images)
        } else {
            Err(ControllerError::InvalidConfig(format!(
                "missing required image environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Runtime configuration for the Provisioning Controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Namespace of the managed Secret and Deployment
    pub target_namespace: String,
    /// Namespace to watch Provisioning resources in; `None` watches all
    pub watch_namespace: Option<String>,
    /// Operand version reported on the ClusterOperator
    pub operator_version: String,
    pub metrics_bind_address: SocketAddr,
    pub images: BaremetalImages,
}

impl OperatorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let images = BaremetalImages::from_lookup(&lookup)?;

        let target_namespace = non_empty(lookup("TARGET_NAMESPACE"))
            .unwrap_or_else(|| DEFAULT_TARGET_NAMESPACE.to_string());
        let watch_namespace = non_empty(lookup("WATCH_NAMESPACE"));
        let operator_version = non_empty(lookup("OPERATOR_VERSION"))
            .or_else(|| non_empty(lookup("RELEASE_VERSION")))
            .unwrap_or_else(|| DEFAULT_OPERATOR_VERSION.to_string());

        let bind = non_empty(lookup("METRICS_BIND_ADDRESS"))
            .unwrap_or_else(|| DEFAULT_METRICS_BIND_ADDRESS.to_string());
        let metrics_bind_address = bind.parse::<SocketAddr>().map_err(|e| {
            ControllerError::InvalidConfig(format!("METRICS_BIND_ADDRESS {bind:?} is not a socket address: {e}"))
        })?;

        Ok(Self {
            target_namespace,
            watch_namespace,
            operator_version,
            metrics_bind_address,
            images,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
