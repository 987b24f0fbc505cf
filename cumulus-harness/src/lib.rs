//! Cumulus Harness
//!
//! Acceptance-test scaffolding for providers: exists/destroy checks, wait
//! helpers, sweepers that garbage-collect leftover test resources, and
//! string-templated configuration fixtures.

pub mod check;
pub mod fixture;
pub mod settings;
pub mod sweep;
pub mod wait;

#[cfg(test)]
pub(crate) mod memory;
