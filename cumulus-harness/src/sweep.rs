//! Sweepers - garbage-collect leftover test resources
//!
//! A sweeper lists all live resources of one type, keeps the identifiers
//! matching the harness naming convention, and deletes them. Per-resource
//! failures are collected into the report instead of aborting the run, so
//! one stuck resource does not leave everything else behind.

use async_trait::async_trait;
use cumulus_core::provider::{Provider, ProviderError};
use cumulus_core::resource::ResourceId;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

/// One sweepable resource type
#[async_trait]
pub trait Sweep: Send + Sync {
    /// Sweeper name, unique within a registry
    fn name(&self) -> &str;

    /// Resource type this sweeper deletes
    fn resource_type(&self) -> &str;

    /// Names of sweepers that must run before this one
    ///
    /// Resources that reference this type (its dependents) are swept first
    /// so deletes do not fail on dangling references.
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether a listed identifier belongs to the harness naming convention
    fn matches(&self, identifier: &str, prefix: &str) -> bool {
        identifier.starts_with(prefix)
    }

    /// Hook invoked before each delete (e.g., detach attachments)
    async fn pre_delete(
        &self,
        _provider: &dyn Provider,
        _identifier: &str,
    ) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Plain sweeper over one resource type with default matching
pub struct ResourceSweeper {
    name: String,
    resource_type: String,
    depends_on: Vec<String>,
}

impl ResourceSweeper {
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, sweeper: impl Into<String>) -> Self {
        self.depends_on.push(sweeper.into());
        self
    }
}

#[async_trait]
impl Sweep for ResourceSweeper {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn depends_on(&self) -> Vec<String> {
        self.depends_on.clone()
    }
}

/// Registration and ordering errors
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Sweeper '{0}' is already registered")]
    Duplicate(String),

    #[error("Sweeper '{sweeper}' depends on unknown sweeper '{dependency}'")]
    UnknownDependency { sweeper: String, dependency: String },

    #[error("Dependency cycle involving sweeper '{0}'")]
    Cycle(String),
}

/// One failed delete within a sweep run
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub resource_type: String,
    pub identifier: String,
    pub message: String,
}

/// Result of running one sweeper
#[derive(Debug, Serialize)]
pub struct SweeperOutcome {
    pub sweeper: String,
    pub resource_type: String,
    /// Identifiers deleted (or that would be deleted under dry-run)
    pub swept: Vec<String>,
    /// Listed identifiers outside the naming convention
    pub skipped: usize,
    pub failures: Vec<SweepFailure>,
}

/// Aggregated result of a sweep run
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    pub dry_run: bool,
    pub outcomes: Vec<SweeperOutcome>,
}

impl SweepReport {
    pub fn swept_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.swept.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.failures.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    /// Serialize the report, e.g. for CI artifacts
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Registry of sweepers with dependency-aware ordering
#[derive(Default)]
pub struct SweepRegistry {
    sweepers: Vec<Box<dyn Sweep>>,
}

impl SweepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sweeper: impl Sweep + 'static) -> Result<(), SweepError> {
        if self.sweepers.iter().any(|s| s.name() == sweeper.name()) {
            return Err(SweepError::Duplicate(sweeper.name().to_string()));
        }
        self.sweepers.push(Box::new(sweeper));
        Ok(())
    }

    pub fn sweepers(&self) -> &[Box<dyn Sweep>] {
        &self.sweepers
    }

    /// Order sweeper indices so dependencies run before their dependents
    fn order(&self) -> Result<Vec<usize>, SweepError> {
        let mut ordered = Vec::new();
        let mut visited = vec![false; self.sweepers.len()];
        let mut in_progress = vec![false; self.sweepers.len()];

        fn visit(
            registry: &SweepRegistry,
            idx: usize,
            visited: &mut [bool],
            in_progress: &mut [bool],
            ordered: &mut Vec<usize>,
        ) -> Result<(), SweepError> {
            if visited[idx] {
                return Ok(());
            }
            if in_progress[idx] {
                return Err(SweepError::Cycle(registry.sweepers[idx].name().to_string()));
            }
            in_progress[idx] = true;

            for dependency in registry.sweepers[idx].depends_on() {
                let dep_idx = registry
                    .sweepers
                    .iter()
                    .position(|s| s.name() == dependency)
                    .ok_or_else(|| SweepError::UnknownDependency {
                        sweeper: registry.sweepers[idx].name().to_string(),
                        dependency: dependency.clone(),
                    })?;
                visit(registry, dep_idx, visited, in_progress, ordered)?;
            }

            in_progress[idx] = false;
            visited[idx] = true;
            ordered.push(idx);
            Ok(())
        }

        for idx in 0..self.sweepers.len() {
            visit(self, idx, &mut visited, &mut in_progress, &mut ordered)?;
        }

        Ok(ordered)
    }

    /// Run every registered sweeper
    pub async fn run(
        &self,
        provider: &dyn Provider,
        prefix: &str,
        dry_run: bool,
    ) -> Result<SweepReport, SweepError> {
        self.run_filtered(provider, prefix, dry_run, None).await
    }

    /// Run the registered sweepers, optionally restricted to one resource type
    pub async fn run_filtered(
        &self,
        provider: &dyn Provider,
        prefix: &str,
        dry_run: bool,
        only_type: Option<&str>,
    ) -> Result<SweepReport, SweepError> {
        let order = self.order()?;
        let mut report = SweepReport {
            dry_run,
            ..Default::default()
        };

        for idx in order {
            let sweeper = &self.sweepers[idx];
            if let Some(only) = only_type
                && sweeper.resource_type() != only
            {
                continue;
            }

            report
                .outcomes
                .push(self.run_one(provider, sweeper.as_ref(), prefix, dry_run).await);
        }

        Ok(report)
    }

    async fn run_one(
        &self,
        provider: &dyn Provider,
        sweeper: &dyn Sweep,
        prefix: &str,
        dry_run: bool,
    ) -> SweeperOutcome {
        let resource_type = sweeper.resource_type().to_string();
        let mut outcome = SweeperOutcome {
            sweeper: sweeper.name().to_string(),
            resource_type: resource_type.clone(),
            swept: Vec::new(),
            skipped: 0,
            failures: Vec::new(),
        };

        let identifiers = match provider.list(&resource_type).await {
            Ok(identifiers) => identifiers,
            Err(e) => {
                warn!("sweeper {} failed to list: {}", sweeper.name(), e);
                outcome.failures.push(SweepFailure {
                    resource_type,
                    identifier: String::new(),
                    message: format!("list failed: {}", e),
                });
                return outcome;
            }
        };

        for identifier in identifiers {
            if !sweeper.matches(&identifier, prefix) {
                outcome.skipped += 1;
                continue;
            }

            if dry_run {
                info!("would sweep {} {}", resource_type, identifier);
                outcome.swept.push(identifier);
                continue;
            }

            match self.delete_one(provider, sweeper, &resource_type, &identifier).await {
                Ok(()) => {
                    info!("swept {} {}", resource_type, identifier);
                    outcome.swept.push(identifier);
                }
                Err(e) => {
                    warn!("failed to sweep {} {}: {}", resource_type, identifier, e);
                    outcome.failures.push(SweepFailure {
                        resource_type: resource_type.clone(),
                        identifier,
                        message: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    async fn delete_one(
        &self,
        provider: &dyn Provider,
        sweeper: &dyn Sweep,
        resource_type: &str,
        identifier: &str,
    ) -> Result<(), ProviderError> {
        sweeper.pre_delete(provider, identifier).await?;

        let id = ResourceId::new(resource_type, identifier);
        match provider.delete(&id, identifier).await {
            Ok(()) => Ok(()),
            // Already gone counts as swept
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}
