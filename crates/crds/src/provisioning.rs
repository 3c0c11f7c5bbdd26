//! Provisioning CRD
//!
//! Describes the bare-metal provisioning network. Created by the installer
//! from admin-supplied data; exactly one instance (named
//! [`PROVISIONING_CR_NAME`]) is honoured per cluster.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Well-known name of the singleton Provisioning resource.
/// Instances with any other name are ignored by the controller.
pub const PROVISIONING_CR_NAME: &str = "provisioning-configuration";

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "metal3.io",
    version = "v1alpha1",
    kind = "Provisioning",
    plural = "provisionings",
    namespaced,
    status = "ProvisioningStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningSpec {
    /// Name of the NIC on the provisioning network (e.g. `eth1`, `ens3`)
    #[serde(default)]
    pub provisioning_interface: String,

    /// IP address assigned to the provisioning interface. Must be inside the
    /// provisioning network and outside the DHCP range.
    #[serde(default, rename = "provisioningIP")]
    pub provisioning_ip: String,

    /// Provisioning network in CIDR notation
    #[serde(default, rename = "provisioningNetworkCIDR")]
    pub provisioning_network_cidr: String,

    /// Whether the DHCP server for the provisioning network runs outside
    /// the metal3 cluster
    #[serde(default, rename = "provisioningDHCPExternal")]
    pub provisioning_dhcp_external: bool,

    /// Two comma separated addresses inside the provisioning network: the
    /// first and last address handed out by the in-cluster DHCP server
    #[serde(default, rename = "provisioningDHCPRange")]
    pub provisioning_dhcp_range: String,

    /// Location of the OS image used to boot provisioned hosts
    #[serde(default, rename = "provisioningOSDownloadURL")]
    pub provisioning_os_download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningStatus {
    /// Generation last acted upon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Free-form operator conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<crate::ClusterOperatorStatusCondition>,
}

impl Provisioning {
    /// Whether this instance is the singleton the controller acts upon.
    pub fn is_singleton(&self) -> bool {
        self.metadata.name.as_deref() == Some(PROVISIONING_CR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_wire_names() {
        let spec = ProvisioningSpec {
            provisioning_interface: "ensp0".to_string(),
            provisioning_ip: "172.30.20.3".to_string(),
            provisioning_network_cidr: "172.30.20.0/24".to_string(),
            provisioning_dhcp_external: false,
            provisioning_dhcp_range: "172.30.20.11, 172.30.20.101".to_string(),
            provisioning_os_download_url: "http://172.22.0.1/images/rhcos.qcow2".to_string(),
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["provisioningInterface"], "ensp0");
        assert_eq!(value["provisioningIP"], "172.30.20.3");
        assert_eq!(value["provisioningNetworkCIDR"], "172.30.20.0/24");
        assert_eq!(value["provisioningDHCPExternal"], false);
        assert_eq!(value["provisioningDHCPRange"], "172.30.20.11, 172.30.20.101");
        assert_eq!(value["provisioningOSDownloadURL"], "http://172.22.0.1/images/rhcos.qcow2");
    }

    #[test]
    fn test_omitted_fields_default_to_empty() {
        let spec: ProvisioningSpec = serde_json::from_str(r#"{"provisioningIP": "10.0.0.2"}"#).unwrap();
        assert_eq!(spec.provisioning_ip, "10.0.0.2");
        assert!(spec.provisioning_interface.is_empty());
        assert!(spec.provisioning_network_cidr.is_empty());
        assert!(!spec.provisioning_dhcp_external);
    }

    #[test]
    fn test_singleton_name() {
        let named = Provisioning::new(PROVISIONING_CR_NAME, ProvisioningSpec::default());
        assert!(named.is_singleton());
        let other = Provisioning::new("something-else", ProvisioningSpec::default());
        assert!(!other.is_singleton());
    }
}
