//! Reconciliation logic for the Provisioning singleton.
//!
//! - `provisioning`: the reconcile pass itself (admission, fetch, Secret and
//!   Deployment phases)
//! - this module: the shared `Reconciler` state, status reporting around each
//!   pass, and per-key retry backoff

pub mod provisioning;

use crate::backoff::FibonacciBackoff;
use crate::config::OperatorConfig;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::status::StatusTracker;
use crds::Provisioning;
use resource_store::ResourceStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const BACKOFF_MIN: Duration = Duration::from_secs(5);
const BACKOFF_MAX: Duration = Duration::from_secs(300);

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::new(BACKOFF_MIN, BACKOFF_MAX),
            error_count: 0,
        }
    }

    fn increment_error(&mut self) {
        self.error_count += 1;
    }

    fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Identity of the object a pass was queued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReconcileRequest {
    pub namespace: Option<String>,
    pub name: String,
}

impl ReconcileRequest {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn from_object(provisioning: &Provisioning) -> Result<Self, ControllerError> {
        let name = provisioning
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| ControllerError::MissingObjectKey("Provisioning missing name".to_string()))?;
        Ok(Self::new(provisioning.metadata.namespace.as_deref(), name))
    }

    /// `namespace/name`, or just `name` for a request without namespace.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReconcileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Result of a successful reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The request named something other than the singleton
    Ignored,
    /// The Provisioning no longer exists
    Deleted,
    /// Secret and Deployment exist
    Synced,
}

impl ReconcileOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileOutcome::Ignored => "ignored",
            ReconcileOutcome::Deleted => "deleted",
            ReconcileOutcome::Synced => "synced",
        }
    }
}

/// Reconciles the Provisioning singleton into the metal3 Secret and Deployment.
pub struct Reconciler {
    pub(crate) store: Arc<dyn ResourceStore>,
    pub(crate) config: OperatorConfig,
    pub(crate) status: StatusTracker,
    pub(crate) metrics: Metrics,
    /// Error count tracking per resource (namespace/name -> BackoffState)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(store: Arc<dyn ResourceStore>, config: OperatorConfig, metrics: Metrics) -> Self {
        let status = StatusTracker::new(store.clone(), config.target_namespace.clone());
        Self {
            store,
            config,
            status,
            metrics,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reports Progressing before the first pass. A failure here is logged
    /// and the next pass reports again.
    pub async fn startup(&self) {
        match self.status.status_progressing(&self.config.operator_version).await {
            Ok(()) => info!("Reported initial ClusterOperator status"),
            Err(e) => warn!("Failed to report initial ClusterOperator status (will continue): {}", e),
        }
    }

    /// Runs one pass and reports its outcome on the ClusterOperator.
    ///
    /// A synced pass marks the operator Available; a failure to record that
    /// fails the pass. A failed pass marks it Degraded (best effort) and the
    /// original error is returned for retry.
    pub async fn reconcile(&self, request: &ReconcileRequest) -> Result<ReconcileOutcome, ControllerError> {
        let started = Instant::now();
        let result = self.report(self.reconcile_provisioning(request).await).await;

        let label = match &result {
            Ok(outcome) => outcome.as_str(),
            Err(_) => "error",
        };
        self.metrics.record(label, started.elapsed());
        result
    }

    async fn report(
        &self,
        result: Result<ReconcileOutcome, ControllerError>,
    ) -> Result<ReconcileOutcome, ControllerError> {
        match result {
            Ok(ReconcileOutcome::Synced) => {
                self.status.status_available(&self.config.operator_version).await?;
                Ok(ReconcileOutcome::Synced)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(status_err) = self.status.status_degraded(&e.to_string()).await {
                    warn!("Failed to report Degraded status: {}", status_err);
                }
                Err(e)
            }
        }
    }

    /// Get the Fibonacci backoff duration for a resource based on its error count
    ///
    /// Returns (backoff, error_count)
    pub fn get_backoff_for_resource(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(resource_key.to_string())
                    .or_insert_with(BackoffState::new);
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (BACKOFF_MIN, 0)
            }
        }
    }

    /// Increment error count for a resource
    pub fn increment_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states
                .entry(resource_key.to_string())
                .or_insert_with(BackoffState::new)
                .increment_error();
        }
    }

    /// Reset error count for a resource (on successful reconciliation)
    pub fn reset_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            if let Some(state) = states.get_mut(resource_key) {
                state.reset();
            }
        }
    }
}
