//! Main controller implementation.
//!
//! Wires the Kubernetes client, the reconciler and the probe server
//! together and runs them until one of them stops.

use crate::config::OperatorConfig;
use crate::error::ControllerError;
use crate::metrics::{Metrics, serve as serve_probes};
use crate::reconciler::Reconciler;
use crate::watcher::watch_provisioning;
use crds::Provisioning;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use resource_store::KubeResourceStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for the Provisioning singleton.
#[derive(Debug)]
pub struct Controller {
    provisioning_watcher: JoinHandle<Result<(), ControllerError>>,
    probe_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates the controller and starts its background tasks.
    pub async fn new(config: OperatorConfig) -> Result<Self, ControllerError> {
        info!("Initializing Provisioning Controller");

        let kube_client = Client::try_default().await?;
        let metrics = Metrics::new()?;
        let ready = Arc::new(AtomicBool::new(false));

        let probe_server = {
            let metrics = metrics.clone();
            let ready = ready.clone();
            let addr = config.metrics_bind_address;
            tokio::spawn(async move { serve_probes(addr, metrics, ready).await })
        };

        let provisionings: Api<Provisioning> = match config.watch_namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client.clone(), ns),
            None => Api::all(kube_client.clone()),
        };
        let deployments: Api<Deployment> = Api::namespaced(kube_client.clone(), &config.target_namespace);
        let secrets: Api<Secret> = Api::namespaced(kube_client.clone(), &config.target_namespace);

        let store = Arc::new(KubeResourceStore::new(kube_client));
        let reconciler = Arc::new(Reconciler::new(store, config, metrics));

        reconciler.startup().await;

        let provisioning_watcher = tokio::spawn(async move {
            watch_provisioning(provisionings, deployments, secrets, reconciler).await
        });
        ready.store(true, Ordering::Relaxed);

        Ok(Self {
            provisioning_watcher,
            probe_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Provisioning Controller running");

        // Both tasks run forever; whichever exits first ends the process
        tokio::select! {
            result = &mut self.provisioning_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Provisioning watcher panicked: {}", e)))??;
            }
            result = &mut self.probe_server => {
                result.map_err(|e| ControllerError::Watch(format!("Probe server panicked: {}", e)))??;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
            }
        }

        Ok(())
    }
}
