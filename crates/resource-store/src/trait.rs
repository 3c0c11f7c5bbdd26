//! ResourceStore trait for mocking
//!
//! Reconciliation code talks to the cluster only through this trait so that
//! unit tests can substitute an in-memory implementation.

use crate::error::StoreError;
use crds::{ClusterOperator, Provisioning};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;

/// Object operations used by the provisioning operator.
///
/// Lookups return [`StoreError::NotFound`] for missing objects. Creates
/// return [`StoreError::AlreadyExists`] when the name is taken. There is no
/// update path for Secrets or Deployments: managed objects are create-only.
#[async_trait::async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_provisioning(&self, namespace: Option<&str>, name: &str) -> Result<Provisioning, StoreError>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError>;
    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError>;

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, StoreError>;
    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, StoreError>;

    async fn get_cluster_operator(&self, name: &str) -> Result<ClusterOperator, StoreError>;
    /// Creates the object. The status subresource is not persisted by a create.
    async fn create_cluster_operator(&self, co: &ClusterOperator) -> Result<ClusterOperator, StoreError>;
    /// Writes `co.status` through the status subresource.
    async fn update_cluster_operator_status(&self, co: &ClusterOperator) -> Result<ClusterOperator, StoreError>;
}
