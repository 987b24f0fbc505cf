//! String-templated configuration fixtures
//!
//! Acceptance tests render declarative configuration from plain string
//! templates with `${var}` placeholders, and name their resources with a
//! random suffix under the sweeper naming convention.

use std::collections::HashMap;

use rand::Rng;
use rand::distributions::Alphanumeric;
use thiserror::Error;

/// Length of the random suffix appended by `random_name`
const SUFFIX_LEN: usize = 8;

/// Errors produced while rendering a fixture
#[derive(Debug, Error, PartialEq)]
pub enum FixtureError {
    #[error("Unknown placeholder '${{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("Unterminated placeholder starting at byte {0}")]
    Unterminated(usize),
}

/// A configuration fixture template with `${var}` placeholders
#[derive(Debug, Clone)]
pub struct FixtureTemplate {
    template: String,
}

impl FixtureTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render the template with the given variables
    ///
    /// Every placeholder must be bound; unused variables are fine.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<String, FixtureError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                FixtureError::Unterminated(self.template.len() - rest.len() + start)
            })?;
            let name = &after[..end];
            let value = vars
                .get(name)
                .ok_or_else(|| FixtureError::UnknownPlaceholder(name.to_string()))?;
            out.push_str(value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Generate a resource name under the sweeper naming convention
///
/// Returns `<prefix>-<random suffix>` so leftover resources are picked up
/// by a prefix-matching sweeper.
pub fn random_name(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", prefix, suffix.to_lowercase())
}
