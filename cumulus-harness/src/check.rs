//! Exists/destroy checks used by acceptance tests
//!
//! An exists check reads a resource and fails if it is absent; a destroy
//! check reads a resource and succeeds only if it is absent. A not-found
//! error from the provider counts as absence, any other error is a hard
//! failure.

use cumulus_core::provider::{Provider, ProviderError};
use cumulus_core::resource::{ResourceId, State, Value};
use thiserror::Error;

/// Errors produced by check functions
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Resource {id} not found")]
    Missing { id: ResourceId },

    #[error("Resource {id} still exists")]
    StillExists { id: ResourceId },

    #[error("Attribute '{key}' of {id}: expected {expected:?}, got {got:?}")]
    AttributeMismatch {
        id: ResourceId,
        key: String,
        expected: Value,
        got: Option<Value>,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Check that a resource exists remotely, returning its observed state
pub async fn check_exists<P: Provider>(
    provider: &P,
    id: &ResourceId,
    identifier: &str,
) -> Result<State, CheckError> {
    let state = provider.read(id, Some(identifier)).await?;
    if state.exists {
        Ok(state)
    } else {
        Err(CheckError::Missing { id: id.clone() })
    }
}

/// Check that a resource is gone
///
/// Not-found (either as `exists == false` or as a not-found error) is
/// success; any other provider error propagates.
pub async fn check_destroyed<P: Provider>(
    provider: &P,
    id: &ResourceId,
    identifier: &str,
) -> Result<(), CheckError> {
    match provider.read(id, Some(identifier)).await {
        Ok(state) if state.exists => Err(CheckError::StillExists { id: id.clone() }),
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Assert that an observed attribute has the expected value
pub fn assert_attr_eq(state: &State, key: &str, expected: &Value) -> Result<(), CheckError> {
    match state.attributes.get(key) {
        Some(got) if got == expected => Ok(()),
        got => Err(CheckError::AttributeMismatch {
            id: state.id.clone(),
            key: key.to_string(),
            expected: expected.clone(),
            got: got.cloned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryProvider;
    use std::collections::HashMap;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn exists_check_passes_for_live_resource() {
        let provider = MemoryProvider::new();
        provider.insert("s3_bucket", "cmls-test-abc", attrs(&[("Region", "us-east-1")]));

        let id = ResourceId::new("s3_bucket", "assets");
        let state = check_exists(&provider, &id, "cmls-test-abc").await.unwrap();
        assert_eq!(state.identifier.as_deref(), Some("cmls-test-abc"));
    }

    #[tokio::test]
    async fn exists_check_fails_for_missing_resource() {
        let provider = MemoryProvider::new();
        let id = ResourceId::new("s3_bucket", "assets");

        let err = check_exists(&provider, &id, "cmls-test-abc").await.unwrap_err();
        assert!(matches!(err, CheckError::Missing { .. }));
    }

    #[tokio::test]
    async fn destroy_check_passes_for_missing_resource() {
        let provider = MemoryProvider::new();
        let id = ResourceId::new("s3_bucket", "assets");

        check_destroyed(&provider, &id, "cmls-test-abc").await.unwrap();
    }

    #[tokio::test]
    async fn destroy_check_fails_for_live_resource() {
        let provider = MemoryProvider::new();
        provider.insert("s3_bucket", "cmls-test-abc", HashMap::new());

        let id = ResourceId::new("s3_bucket", "assets");
        let err = check_destroyed(&provider, &id, "cmls-test-abc").await.unwrap_err();
        assert!(matches!(err, CheckError::StillExists { .. }));
    }

    #[test]
    fn attribute_assertion() {
        let id = ResourceId::new("s3_bucket", "assets");
        let state = State::existing(id, attrs(&[("Region", "us-east-1")]));

        assert_attr_eq(&state, "Region", &Value::String("us-east-1".to_string())).unwrap();

        let err =
            assert_attr_eq(&state, "Region", &Value::String("eu-west-1".to_string())).unwrap_err();
        assert!(matches!(err, CheckError::AttributeMismatch { .. }));

        let err = assert_attr_eq(&state, "Missing", &Value::Bool(true)).unwrap_err();
        assert!(matches!(
            err,
            CheckError::AttributeMismatch { got: None, .. }
        ));
    }
}
