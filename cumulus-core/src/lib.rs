//! Cumulus Core
//!
//! Core library for a cloud provider plugin toolkit: declared resources,
//! observed state, the provider trait, and attribute-level drift detection.

pub mod differ;
pub mod effect;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
