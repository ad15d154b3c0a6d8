//! # Lifecycle Configuration
//!
//! Governs the default phase table, the default scheduler, and test-only
//! hook-failure-swallowing. Loadable via the `config` crate the same way
//! `tasker-shared::config` layers TOML with environment overrides.

use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, LifecycleResult};
use crate::phase::{Phase, PhaseTable};

/// The scheduler a freshly-constructed `AsyncUnitOfWork` defaults to when
/// the caller does not supply one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultScheduler {
    #[default]
    Inline,
    Tokio,
}

/// An application-defined extension to the standard phase table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtraPhase {
    pub name: String,
    pub order: i32,
}

/// Configuration for the processing lifecycle engine.
///
/// Mirrors the shape `tasker-shared::config::orchestration` uses for its
/// component configs: a `Default`-derived struct with `#[serde(default)]`
/// fields, loadable from TOML plus `TASKER_LIFECYCLE__*` environment
/// overrides via the `config` crate's layered `File`/`Environment` sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Application-defined phases to append to the standard six-phase table.
    pub extra_phases: Vec<ExtraPhase>,
    /// Which scheduler a new `AsyncUnitOfWork` uses when none is given.
    pub default_scheduler: DefaultScheduler,
    /// When set, a panicking terminal hook is logged and swallowed instead
    /// of being allowed to unwind into the caller. `true` in production;
    /// a test wanting a buggy hook to fail loudly instead sets this `false`.
    pub swallow_hook_panics: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            extra_phases: Vec::new(),
            default_scheduler: DefaultScheduler::default(),
            swallow_hook_panics: true,
        }
    }
}

impl LifecycleConfig {
    /// Load layered configuration from `path` (TOML) overridden by any
    /// `TASKER_LIFECYCLE__*` environment variables, the same precedence
    /// order `tasker-shared::config` uses for `tasker.toml`.
    pub fn load(path: impl AsRef<str>) -> LifecycleResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("TASKER_LIFECYCLE").separator("__"))
            .build()
            .map_err(|err| LifecycleError::ConfigError(err.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|err| LifecycleError::ConfigError(err.to_string()))
    }

    /// The phase table this configuration produces: the standard table with
    /// `extra_phases` appended.
    pub fn phase_table(&self) -> PhaseTable {
        self.extra_phases
            .iter()
            .fold(PhaseTable::standard(), |table, extra| {
                table.with_phase(Phase::new(extra.name.clone(), extra.order))
            })
    }
}
