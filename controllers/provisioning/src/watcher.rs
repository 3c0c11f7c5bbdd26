//! Kubernetes resource watchers.
//!
//! Drives reconciliation with `kube_runtime::Controller`. The runtime keys
//! its queue by object reference, so at most one pass per Provisioning is in
//! flight and repeated events for a queued key collapse into one pass.
//! Deployments and Secrets are watched through their controller owner
//! reference and requeue the owning Provisioning.

use crate::error::ControllerError;
use crate::reconciler::{ReconcileRequest, Reconciler};
use crds::Provisioning;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, ResourceExt};
use kube_runtime::{Controller, controller::{Action, Config as ControllerConfig}, watcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

async fn reconcile(provisioning: Arc<Provisioning>, reconciler: Arc<Reconciler>) -> Result<Action, ControllerError> {
    let request = ReconcileRequest::from_object(&provisioning)?;
    let outcome = reconciler.reconcile(&request).await?;
    debug!("Provisioning {} reconciled: {:?}", request, outcome);
    reconciler.reset_error(&request.key());
    Ok(Action::await_change())
}

fn error_policy(provisioning: Arc<Provisioning>, error: &ControllerError, reconciler: Arc<Reconciler>) -> Action {
    let key = ReconcileRequest::new(provisioning.namespace().as_deref(), &provisioning.name_any()).key();
    reconciler.increment_error(&key);
    let (backoff, error_count) = reconciler.get_backoff_for_resource(&key);
    warn!(
        "Reconciliation of Provisioning {} failed (attempt {}), retrying in {:?}: {}",
        key, error_count, backoff, error
    );
    Action::requeue(backoff)
}

/// Watches Provisioning resources and the objects they own until the
/// watch stream ends.
pub async fn watch_provisioning(
    provisionings: Api<Provisioning>,
    deployments: Api<Deployment>,
    secrets: Api<Secret>,
    reconciler: Arc<Reconciler>,
) -> Result<(), ControllerError> {
    // Single worker: passes never run concurrently
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(1))
        .concurrency(1);

    Controller::new(provisionings, watcher::Config::default())
        .owns(deployments, watcher::Config::default())
        .owns(secrets, watcher::Config::default())
        .with_config(controller_config)
        .run(reconcile, error_policy, reconciler)
        .for_each(|res| async move {
            match res {
                Ok((object, _)) => debug!("Reconciled {}", object),
                Err(e) => error!("Provisioning controller error: {}", e),
            }
        })
        .await;

    Err(ControllerError::Watch("Provisioning watch stream ended".to_string()))
}
