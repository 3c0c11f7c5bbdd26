//! Baremetal Provisioning CRD Definitions
//!
//! Resource types consumed and produced by the provisioning operator:
//! - `Provisioning` (metal3.io): the singleton provisioning network description
//! - `ClusterOperator` (config.openshift.io): the cluster-wide health report

pub mod provisioning;
pub mod cluster_operator;

pub use provisioning::*;
pub use cluster_operator::*;
