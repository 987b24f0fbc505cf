//! Wait helpers - retry a probe until it reports done
//!
//! The generic primitive is `wait_until`; `wait_until_gone` is the
//! retry-until-not-found helper acceptance teardowns use.

use std::future::Future;
use std::time::Duration;

use cumulus_core::provider::{Provider, ProviderError};
use cumulus_core::resource::ResourceId;
use log::debug;
use thiserror::Error;

/// Polling configuration
#[derive(Debug, Clone)]
pub struct WaitConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            delay: Duration::from_secs(5),
        }
    }
}

impl WaitConfig {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Errors produced by wait helpers
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Condition not met after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Poll a probe until it returns true or attempts are exhausted
///
/// Throttling errors count as a retry; any other provider error aborts.
pub async fn wait_until<F, Fut>(config: &WaitConfig, mut probe: F) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ProviderError>>,
{
    for attempt in 0..config.max_attempts {
        match probe().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) if e.is_throttled() => {
                debug!("probe throttled on attempt {}, retrying", attempt + 1);
            }
            Err(e) => return Err(e.into()),
        }

        if attempt + 1 < config.max_attempts {
            tokio::time::sleep(config.delay).await;
        }
    }

    Err(WaitError::Timeout {
        attempts: config.max_attempts,
    })
}

/// Re-read a resource until it no longer exists
pub async fn wait_until_gone<P: Provider>(
    provider: &P,
    id: &ResourceId,
    identifier: &str,
    config: &WaitConfig,
) -> Result<(), WaitError> {
    wait_until(config, || async move {
        match provider.read(id, Some(identifier)).await {
            Ok(state) => Ok(!state.exists),
            Err(e) if e.is_not_found() => Ok(true),
            Err(e) => Err(e),
        }
    })
    .await
}
