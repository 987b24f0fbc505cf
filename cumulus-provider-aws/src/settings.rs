//! Shared provider state from which SDK clients are built

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Settings shared by every client the provider constructs
#[derive(Debug, Clone)]
pub struct AwsSettings {
    /// AWS region (e.g., "us-east-1")
    pub region: String,
    /// Named credentials profile, if any
    pub profile: Option<String>,
    /// Endpoint override, used against local API emulators
    pub endpoint_url: Option<String>,
}

impl AwsSettings {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            profile: None,
            endpoint_url: None,
        }
    }

    /// Read settings from the environment
    ///
    /// `CUMULUS_REGION` wins over `AWS_REGION`; the profile comes from
    /// `AWS_PROFILE` and the endpoint override from `CUMULUS_ENDPOINT_URL`.
    pub fn from_env() -> Self {
        let region = std::env::var("CUMULUS_REGION")
            .or_else(|_| std::env::var("AWS_REGION"))
            .unwrap_or_else(|_| "us-east-1".to_string());

        Self {
            region,
            profile: std::env::var("AWS_PROFILE").ok(),
            endpoint_url: std::env::var("CUMULUS_ENDPOINT_URL").ok(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Build the shared SDK configuration all clients are created from
    pub async fn load(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()));

        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }
}
