//! Provisioning Controller
//!
//! Reconciles the `provisioning-configuration` Provisioning resource into
//! the metal3 stack:
//! - Secret: the ironic database credential, generated once
//! - Deployment: image downloaders, baremetal-operator, ironic and inspector,
//!   configured from the provisioning network description
//!
//! Operator health is reported on the `baremetal` ClusterOperator.

mod backoff;
mod config;
mod controller;
mod error;
mod manifests;
mod metrics;
mod reconciler;
mod status;
#[cfg(test)]
mod status_test;
mod watcher;
#[cfg(test)]
mod test_utils;

use crate::config::OperatorConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube uses rustls; pick the ring provider before any client is built
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        info!("rustls crypto provider already installed");
    }

    info!("Starting Provisioning Controller");

    let config = OperatorConfig::from_env()?;

    info!("Configuration:");
    info!("  Target namespace: {}", config.target_namespace);
    info!("  Watch namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Operator version: {}", config.operator_version);
    info!("  Metrics address: {}", config.metrics_bind_address);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
