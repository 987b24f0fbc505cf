//! Harness settings read from the environment

use thiserror::Error;

/// Default prefix for resources created by acceptance tests
pub const DEFAULT_PREFIX: &str = "cmls-test";

/// Errors that can occur when reading harness settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("CUMULUS_REGION is not set")]
    MissingRegion,

    #[error("Environment variable {0} is not valid UTF-8")]
    InvalidValue(String),

    #[error("Prefix must not be empty")]
    EmptyPrefix,
}

/// Settings shared by acceptance tests and sweepers
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    /// Region acceptance tests run against
    pub region: String,
    /// Naming-convention prefix for sweepable resources
    pub prefix: String,
    /// Whether live acceptance tests are enabled (`CUMULUS_ACC=1`)
    pub acceptance: bool,
}

impl HarnessSettings {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            acceptance: false,
        }
    }

    /// Read settings from the environment
    ///
    /// `CUMULUS_REGION` is required; only the prefix has a default.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_parts(
            read_var("CUMULUS_REGION")?,
            read_var("CUMULUS_PREFIX")?,
            read_var("CUMULUS_ACC")?,
        )
    }

    fn from_parts(
        region: Option<String>,
        prefix: Option<String>,
        acceptance: Option<String>,
    ) -> Result<Self, SettingsError> {
        let region = region.ok_or(SettingsError::MissingRegion)?;
        let prefix = prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        if prefix.is_empty() {
            return Err(SettingsError::EmptyPrefix);
        }
        let acceptance = matches!(acceptance.as_deref(), Some("1") | Some("true"));

        Ok(Self {
            region,
            prefix,
            acceptance,
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

fn read_var(name: &str) -> Result<Option<String>, SettingsError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => {
            Err(SettingsError::InvalidValue(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = HarnessSettings::new("us-east-1");
        assert_eq!(settings.prefix, DEFAULT_PREFIX);
        assert!(!settings.acceptance);
    }

    #[test]
    fn with_prefix_overrides() {
        let settings = HarnessSettings::new("us-east-1").with_prefix("ci-run");
        assert_eq!(settings.prefix, "ci-run");
    }

    #[test]
    fn missing_region_is_an_error() {
        let err = HarnessSettings::from_parts(None, None, None).unwrap_err();
        assert!(matches!(err, SettingsError::MissingRegion));
    }

    #[test]
    fn region_alone_is_enough() {
        let settings =
            HarnessSettings::from_parts(Some("eu-west-1".to_string()), None, None).unwrap();
        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(settings.prefix, DEFAULT_PREFIX);
        assert!(!settings.acceptance);
    }

    #[test]
    fn empty_prefix_is_an_error() {
        let err = HarnessSettings::from_parts(
            Some("eu-west-1".to_string()),
            Some(String::new()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::EmptyPrefix));
    }

    #[test]
    fn acceptance_flag_parsing() {
        for (value, expected) in [("1", true), ("true", true), ("0", false), ("yes", false)] {
            let settings = HarnessSettings::from_parts(
                Some("eu-west-1".to_string()),
                None,
                Some(value.to_string()),
            )
            .unwrap();
            assert_eq!(settings.acceptance, expected, "CUMULUS_ACC={}", value);
        }
    }
}
