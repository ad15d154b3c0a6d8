//! # Lifecycle Error Types
//!
//! Unified error handling for the processing lifecycle engine.

use std::sync::Arc;
use thiserror::Error;

use crate::phase::Phase;

/// Lifecycle operation result type.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// A recorded handler failure, shareable across every `on_error` hook
/// without re-allocating or re-wrapping the underlying cause.
pub type Cause = Arc<LifecycleError>;

/// Comprehensive error types for the processing lifecycle engine.
#[derive(Debug, Error, Clone)]
pub enum LifecycleError {
    /// A handler was registered for a phase that has already started or
    /// passed.
    #[error("handler registered too late for phase {phase}: current phase is {current_phase}")]
    TooLate { phase: Phase, current_phase: Phase },

    /// `commit()` / `execute()` was called a second time on the same
    /// context.
    #[error("processing context already committed")]
    AlreadyCommitted,

    /// The first handler failure recorded against a phase bucket. This is
    /// the cause fanned out to every `on_error` hook and returned from the
    /// `commit()` future.
    #[error("handler failed in phase {phase}: {message}")]
    HandlerFailure { phase: Phase, message: String },

    /// A scheduled handler task panicked instead of returning a failure.
    #[error("handler task panicked in phase {phase}: {message}")]
    HandlerPanicked { phase: Phase, message: String },

    /// A resource bag lookup found a value under the requested key whose
    /// concrete type did not match the requested type.
    #[error("resource {key} stored as a different type than requested")]
    ResourceTypeMismatch { key: String },

    /// Configuration failed to load or validate.
    #[error("invalid lifecycle configuration: {0}")]
    ConfigError(String),
}

impl LifecycleError {
    pub fn too_late(phase: Phase, current_phase: Phase) -> Self {
        Self::TooLate {
            phase,
            current_phase,
        }
    }

    pub fn handler_failure(phase: Phase, message: impl Into<String>) -> Self {
        Self::HandlerFailure {
            phase,
            message: message.into(),
        }
    }

    pub fn handler_panicked(phase: Phase, message: impl Into<String>) -> Self {
        Self::HandlerPanicked {
            phase,
            message: message.into(),
        }
    }

    pub fn resource_type_mismatch(key: impl Into<String>) -> Self {
        Self::ResourceTypeMismatch { key: key.into() }
    }

    /// The phase a `HandlerFailure`/`HandlerPanicked` was recorded against,
    /// if this variant carries one.
    pub fn phase(&self) -> Option<&Phase> {
        match self {
            Self::TooLate { phase, .. }
            | Self::HandlerFailure { phase, .. }
            | Self::HandlerPanicked { phase, .. } => Some(phase),
            _ => None,
        }
    }

    /// Whether retrying the same registration/commit call could plausibly
    /// succeed. `TooLate` and `AlreadyCommitted` are programmer errors and
    /// never recoverable by retrying; a handler failure may be, depending on
    /// the handler — the engine itself never retries automatically.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::TooLate { .. } | Self::AlreadyCommitted)
    }
}
