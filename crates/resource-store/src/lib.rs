//! Resource Store
//!
//! The read/write surface the provisioning operator needs from the
//! Kubernetes API: fetch the Provisioning singleton, create-if-missing the
//! managed Secret and Deployment, and maintain the ClusterOperator status.
//!
//! The [`ResourceStore`] trait is what reconciliation code depends on.
//! [`KubeResourceStore`] implements it over `kube::Api`; with the
//! `test-util` feature, [`MockResourceStore`] provides an in-memory
//! implementation that records every call.
//!
//! # Example
//!
//! ```no_run
//! use resource_store::{KubeResourceStore, ResourceStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let store = KubeResourceStore::new(client);
//!
//! match store.get_secret("openshift-baremetal", "metal3-mariadb-password").await {
//!     Ok(secret) => println!("found {:?}", secret.metadata.name),
//!     Err(e) if e.is_not_found() => println!("not created yet"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeResourceStore;
pub use error::StoreError;
pub use store_trait::ResourceStore;
#[cfg(feature = "test-util")]
pub use mock::{Failure, MockResourceStore, StoreCall, StoreOp};
