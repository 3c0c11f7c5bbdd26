//! Mock ResourceStore for unit testing
//!
//! Keeps objects in memory, records every call in order, and can be told to
//! fail specific operations so error paths can be exercised without a cluster.

use crate::error::StoreError;
use crate::store_trait::ResourceStore;
use crds::{ClusterOperator, Provisioning};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use kube::Resource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const DEFAULT_NAMESPACE: &str = "default";

/// Store operation, used for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetProvisioning,
    GetSecret,
    CreateSecret,
    GetDeployment,
    CreateDeployment,
    GetClusterOperator,
    CreateClusterOperator,
    UpdateClusterOperatorStatus,
}

impl StoreOp {
    pub fn is_write(self) -> bool {
        matches!(
            self,
            StoreOp::CreateSecret
                | StoreOp::CreateDeployment
                | StoreOp::CreateClusterOperator
                | StoreOp::UpdateClusterOperatorStatus
        )
    }
}

/// One recorded call: the operation and the `namespace/name` (or `name`) it targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub key: String,
}

/// Failure to inject for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    AlreadyExists,
    Conflict,
    Unavailable,
}

impl Failure {
    fn to_error(self, key: &str) -> StoreError {
        match self {
            Failure::AlreadyExists => StoreError::AlreadyExists(key.to_string()),
            Failure::Conflict => StoreError::Conflict(key.to_string()),
            Failure::Unavailable => StoreError::Unavailable(format!("injected failure for {key}")),
        }
    }
}

type NamespacedMap<K> = Arc<Mutex<HashMap<(String, String), K>>>;

/// In-memory [`ResourceStore`].
#[derive(Clone, Default)]
pub struct MockResourceStore {
    provisionings: NamespacedMap<Provisioning>,
    secrets: NamespacedMap<Secret>,
    deployments: NamespacedMap<Deployment>,
    cluster_operators: Arc<Mutex<HashMap<String, ClusterOperator>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Arc<Mutex<HashMap<StoreOp, Failure>>>,
    /// ClusterOperator another writer creates just ahead of the next create call
    concurrent_cluster_operator: Arc<Mutex<Option<ClusterOperator>>>,
    resource_version: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for MockResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockResourceStore")
            .field("calls", &lock(&self.calls).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ns_key<K: Resource>(obj: &K) -> Result<(String, String), StoreError> {
    let meta = obj.meta();
    let name = meta
        .name
        .clone()
        .ok_or_else(|| StoreError::InvalidObject("object missing name".to_string()))?;
    let namespace = meta
        .namespace
        .clone()
        .ok_or_else(|| StoreError::InvalidObject(format!("{name} missing namespace")))?;
    Ok((namespace, name))
}

impl MockResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a Provisioning to the store (for test setup). Uses `default`
    /// when the object carries no namespace.
    pub fn add_provisioning(&self, provisioning: Provisioning) {
        let namespace = provisioning
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let name = provisioning.metadata.name.clone().unwrap_or_default();
        lock(&self.provisionings).insert((namespace, name), provisioning);
    }

    /// Add a Secret to the store (for test setup)
    pub fn add_secret(&self, secret: Secret) {
        if let Ok(key) = ns_key(&secret) {
            lock(&self.secrets).insert(key, secret);
        }
    }

    /// Add a Deployment to the store (for test setup)
    pub fn add_deployment(&self, deployment: Deployment) {
        if let Ok(key) = ns_key(&deployment) {
            lock(&self.deployments).insert(key, deployment);
        }
    }

    /// Add a ClusterOperator to the store (for test setup)
    pub fn add_cluster_operator(&self, co: ClusterOperator) {
        let name = co.metadata.name.clone().unwrap_or_default();
        lock(&self.cluster_operators).insert(name, co);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        lock(&self.secrets).get(&(namespace.to_string(), name.to_string())).cloned()
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        lock(&self.deployments).get(&(namespace.to_string(), name.to_string())).cloned()
    }

    pub fn cluster_operator(&self, name: &str) -> Option<ClusterOperator> {
        lock(&self.cluster_operators).get(name).cloned()
    }

    /// Make every subsequent `op` fail with `failure` until cleared.
    pub fn fail_on(&self, op: StoreOp, failure: Failure) {
        lock(&self.failures).insert(op, failure);
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Simulates a competing writer: the next `create_cluster_operator` call
    /// finds `co` already stored (as given, status included) and fails with
    /// AlreadyExists.
    pub fn create_cluster_operator_concurrently(&self, co: ClusterOperator) {
        *lock(&self.concurrent_cluster_operator) = Some(co);
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    /// Recorded calls that write to the store.
    pub fn write_calls(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(|c| c.op.is_write()).collect()
    }

    pub fn count(&self, op: StoreOp) -> usize {
        lock(&self.calls).iter().filter(|c| c.op == op).count()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Records the call and returns the injected failure for it, if any.
    fn record(&self, op: StoreOp, key: &str) -> Result<(), StoreError> {
        lock(&self.calls).push(StoreCall { op, key: key.to_string() });
        match lock(&self.failures).get(&op) {
            Some(failure) => Err(failure.to_error(key)),
            None => Ok(()),
        }
    }

    fn next_resource_version(&self) -> String {
        let mut version = lock(&self.resource_version);
        *version += 1;
        version.to_string()
    }

    /// Stamps server-assigned metadata on a newly created object.
    fn stamp<K: Resource>(&self, obj: &mut K) {
        let meta = obj.meta_mut();
        meta.uid = Some(uuid::Uuid::new_v4().to_string());
        meta.resource_version = Some(self.next_resource_version());
        meta.generation = Some(1);
    }
}

#[async_trait::async_trait]
impl ResourceStore for MockResourceStore {
    async fn get_provisioning(&self, namespace: Option<&str>, name: &str) -> Result<Provisioning, StoreError> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let key = format!("{namespace}/{name}");
        self.record(StoreOp::GetProvisioning, &key)?;
        lock(&self.provisionings)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Provisioning {key}")))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        let key = format!("{namespace}/{name}");
        self.record(StoreOp::GetSecret, &key)?;
        self.secret(namespace, name)
            .ok_or_else(|| StoreError::NotFound(format!("Secret {key}")))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let (namespace, name) = ns_key(secret)?;
        let key = format!("{namespace}/{name}");
        self.record(StoreOp::CreateSecret, &key)?;
        let mut secrets = lock(&self.secrets);
        if secrets.contains_key(&(namespace.clone(), name.clone())) {
            return Err(StoreError::AlreadyExists(format!("Secret {key}")));
        }
        let mut created = secret.clone();
        self.stamp(&mut created);
        secrets.insert((namespace, name), created.clone());
        Ok(created)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, StoreError> {
        let key = format!("{namespace}/{name}");
        self.record(StoreOp::GetDeployment, &key)?;
        self.deployment(namespace, name)
            .ok_or_else(|| StoreError::NotFound(format!("Deployment {key}")))
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, StoreError> {
        let (namespace, name) = ns_key(deployment)?;
        let key = format!("{namespace}/{name}");
        self.record(StoreOp::CreateDeployment, &key)?;
        let mut deployments = lock(&self.deployments);
        if deployments.contains_key(&(namespace.clone(), name.clone())) {
            return Err(StoreError::AlreadyExists(format!("Deployment {key}")));
        }
        let mut created = deployment.clone();
        self.stamp(&mut created);
        deployments.insert((namespace, name), created.clone());
        Ok(created)
    }

    async fn get_cluster_operator(&self, name: &str) -> Result<ClusterOperator, StoreError> {
        self.record(StoreOp::GetClusterOperator, name)?;
        self.cluster_operator(name)
            .ok_or_else(|| StoreError::NotFound(format!("ClusterOperator {name}")))
    }

    async fn create_cluster_operator(&self, co: &ClusterOperator) -> Result<ClusterOperator, StoreError> {
        let name = co
            .metadata
            .name
            .clone()
            .ok_or_else(|| StoreError::InvalidObject("ClusterOperator missing name".to_string()))?;
        self.record(StoreOp::CreateClusterOperator, &name)?;
        if let Some(mut winner) = lock(&self.concurrent_cluster_operator).take() {
            self.stamp(&mut winner);
            self.add_cluster_operator(winner);
        }
        let mut cluster_operators = lock(&self.cluster_operators);
        if cluster_operators.contains_key(&name) {
            return Err(StoreError::AlreadyExists(format!("ClusterOperator {name}")));
        }
        let mut created = co.clone();
        // status subresource: a create does not persist status
        created.status = None;
        self.stamp(&mut created);
        cluster_operators.insert(name, created.clone());
        Ok(created)
    }

    async fn update_cluster_operator_status(&self, co: &ClusterOperator) -> Result<ClusterOperator, StoreError> {
        let name = co
            .metadata
            .name
            .clone()
            .ok_or_else(|| StoreError::InvalidObject("ClusterOperator missing name".to_string()))?;
        self.record(StoreOp::UpdateClusterOperatorStatus, &name)?;
        let resource_version = self.next_resource_version();
        let mut cluster_operators = lock(&self.cluster_operators);
        let existing = cluster_operators
            .get_mut(&name)
            .ok_or_else(|| StoreError::NotFound(format!("ClusterOperator {name}")))?;
        existing.status = co.status.clone();
        existing.metadata.resource_version = Some(resource_version);
        Ok(existing.clone())
    }
}
