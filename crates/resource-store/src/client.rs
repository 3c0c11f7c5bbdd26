//! Kubernetes-backed resource store

use crate::error::StoreError;
use crate::store_trait::ResourceStore;
use crds::{ClusterOperator, Provisioning};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use tracing::debug;

/// [`ResourceStore`] implementation over the Kubernetes API.
#[derive(Clone)]
pub struct KubeResourceStore {
    client: Client,
}

impl std::fmt::Debug for KubeResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeResourceStore").finish_non_exhaustive()
    }
}

impl KubeResourceStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn provisioning_api(&self, namespace: Option<&str>) -> Api<Provisioning> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::default_namespaced(self.client.clone()),
        }
    }
}

/// Name and namespace of a namespaced object about to be written.
fn namespaced_key<K: Resource>(obj: &K, kind: &str) -> Result<(String, String), StoreError> {
    let meta = obj.meta();
    let name = meta
        .name
        .clone()
        .ok_or_else(|| StoreError::InvalidObject(format!("{kind} missing name")))?;
    let namespace = meta
        .namespace
        .clone()
        .ok_or_else(|| StoreError::InvalidObject(format!("{kind} {name} missing namespace")))?;
    Ok((namespace, name))
}

#[async_trait::async_trait]
impl ResourceStore for KubeResourceStore {
    async fn get_provisioning(&self, namespace: Option<&str>, name: &str) -> Result<Provisioning, StoreError> {
        self.provisioning_api(namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::from_kube(e, &format!("Provisioning {name}")))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        Api::<Secret>::namespaced(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::from_kube(e, &format!("Secret {namespace}/{name}")))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let (namespace, name) = namespaced_key(secret, "Secret")?;
        debug!("Creating Secret {}/{}", namespace, name);
        Api::<Secret>::namespaced(self.client.clone(), &namespace)
            .create(&PostParams::default(), secret)
            .await
            .map_err(|e| StoreError::from_kube_create(e, &format!("Secret {namespace}/{name}")))
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, StoreError> {
        Api::<Deployment>::namespaced(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::from_kube(e, &format!("Deployment {namespace}/{name}")))
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, StoreError> {
        let (namespace, name) = namespaced_key(deployment, "Deployment")?;
        debug!("Creating Deployment {}/{}", namespace, name);
        Api::<Deployment>::namespaced(self.client.clone(), &namespace)
            .create(&PostParams::default(), deployment)
            .await
            .map_err(|e| StoreError::from_kube_create(e, &format!("Deployment {namespace}/{name}")))
    }

    async fn get_cluster_operator(&self, name: &str) -> Result<ClusterOperator, StoreError> {
        Api::<ClusterOperator>::all(self.client.clone())
            .get(name)
            .await
            .map_err(|e| StoreError::from_kube(e, &format!("ClusterOperator {name}")))
    }

    async fn create_cluster_operator(&self, co: &ClusterOperator) -> Result<ClusterOperator, StoreError> {
        let name = co
            .metadata
            .name
            .clone()
            .ok_or_else(|| StoreError::InvalidObject("ClusterOperator missing name".to_string()))?;
        debug!("Creating ClusterOperator {}", name);
        Api::<ClusterOperator>::all(self.client.clone())
            .create(&PostParams::default(), co)
            .await
            .map_err(|e| StoreError::from_kube_create(e, &format!("ClusterOperator {name}")))
    }

    async fn update_cluster_operator_status(&self, co: &ClusterOperator) -> Result<ClusterOperator, StoreError> {
        let name = co
            .metadata
            .name
            .clone()
            .ok_or_else(|| StoreError::InvalidObject("ClusterOperator missing name".to_string()))?;
        let status_patch = serde_json::json!({ "status": co.status });
        Api::<ClusterOperator>::all(self.client.clone())
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&status_patch))
            .await
            .map_err(|e| StoreError::from_kube(e, &format!("ClusterOperator {name} status")))
    }
}
