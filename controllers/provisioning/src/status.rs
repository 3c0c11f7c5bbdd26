//! ClusterOperator status tracking.
//!
//! The operator reports its health on a single cluster-scoped ClusterOperator.
//! [`StatusTracker`] makes sure that object exists and merges condition and
//! version updates into it. Every update is written, even when nothing changed,
//! so consumers always see a fresh transition time.

use crds::{
    ClusterOperator, ClusterOperatorSpec, ClusterOperatorStatus, ClusterOperatorStatusCondition,
    ClusterStatusConditionType, ConditionStatus, ObjectReference, OperandVersion,
};
use resource_store::{ResourceStore, StoreError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the ClusterOperator owned by this operator.
pub const CLUSTER_OPERATOR_NAME: &str = "baremetal";
/// Component name under which the operator's own version is recorded.
pub const OPERATOR_COMPONENT: &str = "operator";

/// Reason attached to a status change. Always a CamelCase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusReason {
    Empty,
    Syncing,
    SyncFailed,
    DeployComplete,
}

impl StatusReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusReason::Empty => "",
            StatusReason::Syncing => "SyncingResources",
            StatusReason::SyncFailed => "SyncingFailed",
            StatusReason::DeployComplete => "DeployComplete",
        }
    }
}

impl fmt::Display for StatusReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn condition(
    type_: ClusterStatusConditionType,
    status: ConditionStatus,
    reason: StatusReason,
    message: &str,
) -> ClusterOperatorStatusCondition {
    ClusterOperatorStatusCondition::new(type_, status, reason.as_str(), message)
}

/// Upgradeable is always asserted True; no known state blocks an upgrade yet.
fn upgradeable() -> ClusterOperatorStatusCondition {
    condition(
        ClusterStatusConditionType::Upgradeable,
        ConditionStatus::True,
        StatusReason::Empty,
        "",
    )
}

/// Reports operator health on the ClusterOperator.
pub struct StatusTracker {
    store: Arc<dyn ResourceStore>,
    /// Namespace listed in the related objects of a new ClusterOperator
    target_namespace: String,
}

impl fmt::Debug for StatusTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusTracker")
            .field("target_namespace", &self.target_namespace)
            .finish_non_exhaustive()
    }
}

impl StatusTracker {
    pub fn new(store: Arc<dyn ResourceStore>, target_namespace: impl Into<String>) -> Self {
        Self {
            store,
            target_namespace: target_namespace.into(),
        }
    }

    /// ClusterOperator used on first creation: every condition False and the
    /// target namespace as the only related object.
    pub fn default_cluster_operator(&self) -> ClusterOperator {
        let mut co = ClusterOperator::new(CLUSTER_OPERATOR_NAME, ClusterOperatorSpec {});
        co.status = Some(ClusterOperatorStatus {
            conditions: ClusterStatusConditionType::ALL
                .into_iter()
                .map(|type_| condition(type_, ConditionStatus::False, StatusReason::Empty, ""))
                .collect(),
            versions: Vec::new(),
            related_objects: vec![ObjectReference {
                group: String::new(),
                resource: "namespaces".to_string(),
                namespace: None,
                name: self.target_namespace.clone(),
            }],
        });
        co
    }

    /// Fetches the ClusterOperator, creating the default one when missing.
    ///
    /// A create does not persist status, so the default status is pushed
    /// through the status subresource straight after. When another writer
    /// wins the create, its object is used, seeded with the default status
    /// if it has none yet.
    pub async fn get_or_create(&self) -> Result<ClusterOperator, StoreError> {
        match self.store.get_cluster_operator(CLUSTER_OPERATOR_NAME).await {
            Ok(co) => return Ok(co),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        info!("ClusterOperator {} does not exist, creating a new one", CLUSTER_OPERATOR_NAME);
        let desired = self.default_cluster_operator();
        let mut co = match self.store.create_cluster_operator(&desired).await {
            Ok(created) => created,
            Err(e) if e.is_already_exists() => {
                debug!("ClusterOperator {} created concurrently, re-reading", CLUSTER_OPERATOR_NAME);
                let existing = self.store.get_cluster_operator(CLUSTER_OPERATOR_NAME).await?;
                if existing.status.is_some() {
                    return Ok(existing);
                }
                existing
            }
            Err(e) => return Err(e),
        };
        co.status = desired.status;
        self.store.update_cluster_operator_status(&co).await
    }

    /// Sets Progressing according to whether the recorded operator version
    /// differs from `desired_version`, and asserts Upgradeable=True.
    /// Available and Degraded are left as they are.
    pub async fn status_progressing(&self, desired_version: &str) -> Result<(), StoreError> {
        let co = self.get_or_create().await?;

        let current = co
            .status
            .as_ref()
            .and_then(|s| s.operand_version(OPERATOR_COMPONENT));
        let progressing = current != Some(desired_version);
        if progressing {
            info!(desired_version, current = ?current, "Syncing status: progressing");
        } else {
            info!(desired_version, "Syncing status: re-syncing");
        }

        let conditions = vec![
            condition(
                ClusterStatusConditionType::Progressing,
                ConditionStatus::from(progressing),
                StatusReason::Syncing,
                "",
            ),
            upgradeable(),
        ];
        self.update_status(co, conditions, None).await.map(|_| ())
    }

    /// Reports a completed sync at `version`.
    pub async fn status_available(&self, version: &str) -> Result<(), StoreError> {
        let co = self.get_or_create().await?;
        let message = format!("Cluster Baremetal Operator is available at {version}");

        let conditions = vec![
            condition(
                ClusterStatusConditionType::Available,
                ConditionStatus::True,
                StatusReason::DeployComplete,
                &message,
            ),
            condition(
                ClusterStatusConditionType::Progressing,
                ConditionStatus::False,
                StatusReason::DeployComplete,
                &message,
            ),
            condition(
                ClusterStatusConditionType::Degraded,
                ConditionStatus::False,
                StatusReason::DeployComplete,
                "",
            ),
            upgradeable(),
        ];
        let version = OperandVersion::new(OPERATOR_COMPONENT, version);
        self.update_status(co, conditions, Some(version)).await.map(|_| ())
    }

    /// Reports a failed sync. Only the Degraded condition changes.
    pub async fn status_degraded(&self, message: &str) -> Result<(), StoreError> {
        let co = self.get_or_create().await?;
        info!(error = message, "Syncing status: degraded");

        let conditions = vec![condition(
            ClusterStatusConditionType::Degraded,
            ConditionStatus::True,
            StatusReason::SyncFailed,
            message,
        )];
        self.update_status(co, conditions, None).await.map(|_| ())
    }

    /// Merges each condition by type, upserts `version` if given, and writes
    /// the whole status.
    pub async fn update_status(
        &self,
        mut co: ClusterOperator,
        conditions: Vec<ClusterOperatorStatusCondition>,
        version: Option<OperandVersion>,
    ) -> Result<ClusterOperator, StoreError> {
        let status = co.status.get_or_insert_with(ClusterOperatorStatus::default);
        for c in conditions {
            status.set_condition(c);
        }
        if let Some(version) = version {
            status.set_operand_version(version);
        }
        self.store.update_cluster_operator_status(&co).await
    }
}
