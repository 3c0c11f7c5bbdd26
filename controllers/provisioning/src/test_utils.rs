//! Test utilities for unit testing the reconciler and status tracker
//!
//! This module provides helpers for creating test data and wiring a
//! `Reconciler` to an in-memory store.

use crate::config::{BaremetalImages, OperatorConfig};
use crate::metrics::Metrics;
use crate::reconciler::Reconciler;
use crds::{PROVISIONING_CR_NAME, Provisioning, ProvisioningSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use resource_store::MockResourceStore;
use std::sync::Arc;

pub const TEST_NAMESPACE: &str = "openshift-machine-api";
pub const TEST_UID: &str = "5d1e7c2a-0b7e-4f4e-9f4e-3c2d1a0b9e8f";

pub fn test_config() -> OperatorConfig {
    OperatorConfig {
        target_namespace: "openshift-baremetal".to_string(),
        watch_namespace: None,
        operator_version: "4.5.0".to_string(),
        metrics_bind_address: ([127, 0, 0, 1], 8080).into(),
        images: BaremetalImages {
            baremetal_operator: "quay.io/metal3-io/baremetal-operator:test".to_string(),
            ironic: "quay.io/metal3-io/ironic:test".to_string(),
            ironic_inspector: "quay.io/metal3-io/ironic-inspector:test".to_string(),
            ironic_ipa_downloader: "quay.io/metal3-io/ironic-ipa-downloader:test".to_string(),
            ironic_machine_os_downloader: "quay.io/metal3-io/machine-os-downloader:test".to_string(),
            ironic_static_ip_manager: "quay.io/metal3-io/static-ip-manager:test".to_string(),
        },
    }
}

/// The spec used throughout the derivation examples.
pub fn example_spec() -> ProvisioningSpec {
    ProvisioningSpec {
        provisioning_interface: "ensp0".to_string(),
        provisioning_ip: "172.30.20.3".to_string(),
        provisioning_network_cidr: "172.30.20.0/24".to_string(),
        provisioning_dhcp_external: false,
        provisioning_dhcp_range: "172.30.20.11, 172.30.20.101".to_string(),
        provisioning_os_download_url: "http://172.22.0.1/images/rhcos.qcow2".to_string(),
    }
}

/// Helper to create a test Provisioning as the API server would return it
pub fn create_test_provisioning(name: &str, spec: ProvisioningSpec) -> Provisioning {
    let mut provisioning = Provisioning::new(name, spec);
    provisioning.metadata.namespace = Some(TEST_NAMESPACE.to_string());
    provisioning.metadata.uid = Some(TEST_UID.to_string());
    provisioning.metadata.generation = Some(1);
    provisioning
}

pub fn test_owner_reference() -> OwnerReference {
    create_test_provisioning(PROVISIONING_CR_NAME, example_spec())
        .controller_owner_ref(&())
        .unwrap()
}

/// Reconciler sharing state with `store`.
pub fn create_test_reconciler(store: &MockResourceStore) -> Reconciler {
    Reconciler::new(Arc::new(store.clone()), test_config(), Metrics::new().unwrap())
}
