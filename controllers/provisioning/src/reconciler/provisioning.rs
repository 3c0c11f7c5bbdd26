//! The Provisioning reconcile pass.
//!
//! Managed objects are create-only: an existing Secret or Deployment is
//! accepted as is, never compared or updated.

use super::{ReconcileOutcome, ReconcileRequest, Reconciler};
use crate::error::ControllerError;
use crate::manifests::{self, DEPLOYMENT_NAME, MARIADB_SECRET_NAME};
use baremetal_config::DerivedConfig;
use crds::{PROVISIONING_CR_NAME, Provisioning};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use resource_store::StoreError;
use tracing::{debug, info};

/// Outcome of a create that may race with another writer.
fn created_or_exists<T>(result: Result<T, StoreError>, kind: &str, namespace: &str, name: &str) -> Result<(), ControllerError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_already_exists() => {
            info!("{} {}/{} was created concurrently, treating as success", kind, namespace, name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

impl Reconciler {
    /// Brings the Secret and Deployment in line with the Provisioning named
    /// by `request`.
    pub async fn reconcile_provisioning(&self, request: &ReconcileRequest) -> Result<ReconcileOutcome, ControllerError> {
        info!(namespace = ?request.namespace, name = %request.name, "Reconciling Provisioning");

        // provisioning.metal3.io is a singleton
        if request.name != PROVISIONING_CR_NAME {
            info!("Ignoring Provisioning {} without the singleton name", request);
            return Ok(ReconcileOutcome::Ignored);
        }

        let instance = match self
            .store
            .get_provisioning(request.namespace.as_deref(), &request.name)
            .await
        {
            Ok(instance) => instance,
            Err(e) if e.is_not_found() => {
                // Owned objects are garbage collected with their owner
                debug!("Provisioning {} not found, nothing to do", request);
                return Ok(ReconcileOutcome::Deleted);
            }
            Err(e) => return Err(e.into()),
        };

        let owner = controller_owner_ref(&instance)?;
        self.ensure_secret(owner.clone()).await?;
        self.ensure_deployment(&instance, owner).await?;

        Ok(ReconcileOutcome::Synced)
    }

    /// Creates the database password Secret unless it already exists. An
    /// existing Secret keeps its credential.
    async fn ensure_secret(&self, owner: OwnerReference) -> Result<(), ControllerError> {
        let namespace = &self.config.target_namespace;
        match self.store.get_secret(namespace, MARIADB_SECRET_NAME).await {
            Ok(_) => {
                debug!("Secret {}/{} already exists", namespace, MARIADB_SECRET_NAME);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!("Creating Secret {}/{}", namespace, MARIADB_SECRET_NAME);
                let secret = manifests::mariadb_password_secret(namespace, manifests::generate_password(), owner);
                created_or_exists(
                    self.store.create_secret(&secret).await,
                    "Secret",
                    namespace,
                    MARIADB_SECRET_NAME,
                )
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Creates the metal3 Deployment unless it already exists.
    async fn ensure_deployment(&self, instance: &Provisioning, owner: OwnerReference) -> Result<(), ControllerError> {
        let namespace = &self.config.target_namespace;
        match self.store.get_deployment(namespace, DEPLOYMENT_NAME).await {
            Ok(_) => {
                info!("Skip reconcile: Deployment {}/{} already exists", namespace, DEPLOYMENT_NAME);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                let derived = DerivedConfig::from_spec(&instance.spec);
                let deployment = manifests::metal3_deployment(&self.config, &derived, owner);
                info!("Creating Deployment {}/{}", namespace, DEPLOYMENT_NAME);
                created_or_exists(
                    self.store.create_deployment(&deployment).await,
                    "Deployment",
                    namespace,
                    DEPLOYMENT_NAME,
                )
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn controller_owner_ref(instance: &Provisioning) -> Result<OwnerReference, ControllerError> {
    instance.controller_owner_ref(&()).ok_or_else(|| {
        ControllerError::OwnerReference(format!(
            "Provisioning {} has no uid",
            instance.metadata.name.as_deref().unwrap_or_default()
        ))
    })
}
