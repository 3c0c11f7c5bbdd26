//! Resource store errors

use thiserror::Error;

/// Errors returned by [`ResourceStore`](crate::ResourceStore) operations.
///
/// `NotFound` and `AlreadyExists` are expected outcomes that callers resolve
/// locally; everything else should abort the current pass and be retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create raced with another writer
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency conflict on a write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Object is missing data the store needs (name, namespace)
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// Store temporarily unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other Kubernetes API failure
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }

    /// Classifies a read/update error from the API server.
    pub(crate) fn from_kube(err: kube::Error, what: &str) -> Self {
        match api_code(&err) {
            Some(404) => StoreError::NotFound(what.to_string()),
            Some(409) => StoreError::Conflict(what.to_string()),
            _ => StoreError::Kube(err),
        }
    }

    /// Classifies a create error. 409 on create means the name is taken.
    pub(crate) fn from_kube_create(err: kube::Error, what: &str) -> Self {
        match api_code(&err) {
            Some(409) => StoreError::AlreadyExists(what.to_string()),
            _ => StoreError::from_kube(err, what),
        }
    }
}

fn api_code(err: &kube::Error) -> Option<u16> {
    match err {
        kube::Error::Api(response) => Some(response.code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(StoreError::NotFound("secret x".into()).is_not_found());
        assert!(!StoreError::NotFound("secret x".into()).is_already_exists());
        assert!(StoreError::AlreadyExists("secret x".into()).is_already_exists());
        assert!(!StoreError::Conflict("secret x".into()).is_not_found());
        assert!(!StoreError::Unavailable("timeout".into()).is_already_exists());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::NotFound("Secret ns/name".into()).to_string(),
            "Not found: Secret ns/name"
        );
    }
}
