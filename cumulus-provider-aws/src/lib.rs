//! Cumulus AWS Provider
//!
//! Provider implementation backed by the AWS Cloud Control API. Every
//! resource type is handled through the same four Cloud Control calls, so
//! the provider is generic over a type-name registry instead of carrying
//! per-resource client code.

pub mod provider;
pub mod settings;
pub mod types;

pub use provider::CloudControlProvider;
pub use settings::AwsSettings;
pub use types::TypeRegistry;
