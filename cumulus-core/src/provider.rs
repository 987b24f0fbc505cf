//! Provider - Trait abstracting resource operations
//!
//! A Provider defines operations for a specific cloud (AWS, GCP, etc.).
//! It is responsible for translating declared resources into actual API calls.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Classification of a provider failure
///
/// Destroy verification and sweepers only care whether an error means
/// "the resource is gone"; waiters additionally retry on throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote API reported the resource as not found
    NotFound,
    /// The remote API throttled the request
    Throttled,
    /// The resource type is not handled by this provider
    Unsupported,
    /// Any other API or transport failure
    Api,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}", id, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Api,
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::NotFound)
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Throttled)
    }

    pub fn unsupported(resource_type: &str) -> Self {
        Self::new(format!("Unsupported resource type: {}", resource_type))
            .with_kind(ErrorKind::Unsupported)
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// During destroy verification a not-found error counts as success
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_throttled(&self) -> bool {
        self.kind == ErrorKind::Throttled
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "s3_bucket")
    fn name(&self) -> &str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
    }
}

/// Main Provider trait
///
/// Each cloud provider implements this trait.
/// All operations are async and involve side effects.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "aws")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Get the current state of a resource
    ///
    /// Returns `State::not_found()` if the resource does not exist;
    /// absence is a state, not an error.
    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the remote ID (e.g., vpc-xxx)
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource
    ///
    /// The identifier is the remote ID (e.g., vpc-xxx)
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    ///
    /// Deleting a resource that is already gone succeeds.
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// List the remote identifiers of all live resources of a type
    ///
    /// Pagination is the implementation's concern; callers always get the
    /// full listing. Sweepers are the primary consumer.
    fn list(&self, resource_type: &str) -> BoxFuture<'_, ProviderResult<Vec<String>>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, identifier)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier)
    }

    fn list(&self, resource_type: &str) -> BoxFuture<'_, ProviderResult<Vec<String>>> {
        (**self).list(resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider over a fixed inventory of queue identifiers, the shape
    /// a sweeper sees after listing a region full of test leftovers.
    struct InventoryProvider {
        queues: Vec<String>,
    }

    impl InventoryProvider {
        fn with_leftovers() -> Self {
            Self {
                queues: vec![
                    "cmls-test-jobs".to_string(),
                    "cmls-test-events".to_string(),
                    "prod-orders".to_string(),
                ],
            }
        }
    }

    impl Provider for InventoryProvider {
        fn name(&self) -> &'static str {
            "inventory"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(
            &self,
            id: &ResourceId,
            identifier: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let known = identifier.is_some_and(|i| self.queues.iter().any(|q| q == i));
            Box::pin(async move {
                if known {
                    Ok(State::existing(id.clone(), Default::default()))
                } else {
                    Ok(State::not_found(id))
                }
            })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move {
                let identifier = format!("cmls-test-{}", id.name);
                Ok(State::existing(id, attrs).with_identifier(identifier))
            })
        }

        fn update(
            &self,
            id: &ResourceId,
            identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let state = State::existing(id.clone(), to.attributes.clone())
                .with_identifier(identifier.to_string());
            Box::pin(async move { Ok(state) })
        }

        fn delete(&self, _id: &ResourceId, _identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
            // Already-gone identifiers are not an error
            Box::pin(async { Ok(()) })
        }

        fn list(&self, resource_type: &str) -> BoxFuture<'_, ProviderResult<Vec<String>>> {
            let queues = match resource_type {
                "sqs_queue" => self.queues.clone(),
                _ => vec![],
            };
            Box::pin(async move { Ok(queues) })
        }
    }

    #[tokio::test]
    async fn read_unknown_identifier_is_not_found_not_error() {
        let provider = InventoryProvider::with_leftovers();
        let id = ResourceId::new("sqs_queue", "gone");
        let state = provider.read(&id, Some("cmls-test-gone")).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn create_reports_remote_identifier() {
        let provider = InventoryProvider::with_leftovers();
        let resource = Resource::new("sqs_queue", "jobs");
        let state = provider.create(&resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("cmls-test-jobs"));
    }

    #[tokio::test]
    async fn list_returns_all_identifiers_of_a_type() {
        let provider = InventoryProvider::with_leftovers();
        let ids = provider.list("sqs_queue").await.unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().any(|i| i == "prod-orders"));

        let ids = provider.list("s3_bucket").await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn boxed_provider_dispatches_through_blanket_impl() {
        let provider: Box<dyn Provider> = Box::new(InventoryProvider::with_leftovers());
        assert_eq!(provider.name(), "inventory");

        let id = ResourceId::new("sqs_queue", "jobs");
        let state = provider.read(&id, Some("cmls-test-jobs")).await.unwrap();
        assert!(state.exists);

        let ids = provider.list("sqs_queue").await.unwrap();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn error_kind_classification() {
        let err = ProviderError::not_found("gone");
        assert!(err.is_not_found());
        assert!(!err.is_throttled());

        let err = ProviderError::throttled("slow down");
        assert!(err.is_throttled());

        let err = ProviderError::new("boom");
        assert_eq!(err.kind, ErrorKind::Api);
    }

    #[test]
    fn error_display_includes_resource() {
        let err = ProviderError::new("boom").for_resource(ResourceId::new("s3_bucket", "assets"));
        assert_eq!(err.to_string(), "[s3_bucket.assets] boom");
    }
}
