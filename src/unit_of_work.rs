//! # Async Unit of Work
//!
//! The public façade over a `ProcessingContext`: constructs a
//! context with a chosen scheduler, offers fluent registration, and drives
//! the lifecycle to completion via `execute`/`execute_with_result`.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::config::{DefaultScheduler, LifecycleConfig};
use crate::context::{
    Action, OnErrorAction, ProcessingContext, ProcessingLifecycle, WhenCompleteAction,
};
use crate::error::{LifecycleError, LifecycleResult};
use crate::phase::Phase;
use crate::scheduler::{InlineScheduler, Scheduler, TokioScheduler};

/// A handler invoked during a phase that hands back a typed value, used by
/// `execute_with_result`. `Action`'s `LifecycleResult<()>` is the uniform
/// shape every phase handler returns; `Invocation<R>` is the richer shape
/// the single result-bearing handler uses internally before its value is
/// moved into the completion cell.
pub type Invocation<R> = Arc<
    dyn Fn(Arc<ProcessingContext>) -> Pin<Box<dyn Future<Output = LifecycleResult<R>> + Send>>
        + Send
        + Sync,
>;

/// The façade applications construct and drive. Wraps a `ProcessingContext`,
/// delegating registration to it and adding two entry points: `execute`
/// (fire the lifecycle, get back success/failure) and `execute_with_result`
/// (register one result-bearing invocation handler, then run the whole
/// lifecycle around it).
#[derive(Debug, Clone)]
pub struct AsyncUnitOfWork {
    context: Arc<ProcessingContext>,
}

impl AsyncUnitOfWork {
    /// Construct with a random identifier and the default `InlineScheduler`.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Construct with a caller-chosen identifier (e.g. a correlation id
    /// carried on the inbound message) and the default `InlineScheduler`.
    pub fn with_id(identifier: impl Into<String>) -> Self {
        Self::with_scheduler(identifier, Arc::new(InlineScheduler))
    }

    /// Construct with a caller-chosen identifier and scheduler.
    pub fn with_scheduler(identifier: impl Into<String>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            context: ProcessingContext::new(identifier, scheduler),
        }
    }

    /// Construct governed by `config`: the scheduler defaults to whichever
    /// `config.default_scheduler` names, and the context carries `config`
    /// for the duration of the run (hook-panic-swallowing, phase table
    /// extensions).
    pub fn from_config(identifier: impl Into<String>, config: LifecycleConfig) -> Self {
        let scheduler: Arc<dyn Scheduler> = match config.default_scheduler {
            DefaultScheduler::Inline => Arc::new(InlineScheduler),
            DefaultScheduler::Tokio => Arc::new(TokioScheduler),
        };
        Self {
            context: ProcessingContext::with_config(identifier, scheduler, Arc::new(config)),
        }
    }

    pub fn identifier(&self) -> &str {
        self.context.identifier()
    }

    /// The underlying context, for callers that need direct access to the
    /// resource bag or status predicates.
    pub fn context(&self) -> &Arc<ProcessingContext> {
        &self.context
    }

    /// Register `action` to run during `phase`. See `ProcessingLifecycle::on`.
    pub fn on(&self, phase: Phase, action: Action) -> LifecycleResult<&Self> {
        self.context.on(phase, action)?;
        Ok(self)
    }

    /// Register a terminal failure hook. See `ProcessingLifecycle::on_error`.
    pub fn on_error(&self, handler: OnErrorAction) -> &Self {
        self.context.on_error(handler);
        self
    }

    /// Register a terminal success hook. See
    /// `ProcessingLifecycle::when_complete`.
    pub fn when_complete(&self, handler: WhenCompleteAction) -> &Self {
        self.context.when_complete(handler);
        self
    }

    /// Drain every registered phase and resolve with the outcome.
    pub async fn execute(&self) -> LifecycleResult<()> {
        self.context.commit().await
    }

    /// Register `invocation` to run during `phase`, then drive the whole
    /// lifecycle to completion and hand back `invocation`'s typed result.
    ///
    /// The result is threaded out of the generic `Action` slot through an
    /// `Arc<Mutex<Option<R>>>` completion cell populated by the wrapped
    /// handler just before it returns `Ok(())` — the same "typed value out
    /// of a generic slot" shape used to get a step's output back out of a
    /// queue message elsewhere in this codebase.
    pub async fn execute_with_result<R>(
        &self,
        phase: Phase,
        invocation: Invocation<R>,
    ) -> LifecycleResult<R>
    where
        R: Send + 'static,
    {
        let cell: Arc<Mutex<Option<R>>> = Arc::new(Mutex::new(None));
        let cell_for_action = cell.clone();

        let action: Action = Arc::new(move |ctx: Arc<ProcessingContext>| {
            let invocation = invocation.clone();
            let cell = cell_for_action.clone();
            Box::pin(async move {
                let value = invocation(ctx).await?;
                *cell.lock().unwrap() = Some(value);
                Ok(())
            })
        });

        self.context.on(phase, action)?;
        self.execute().await?;

        cell.lock()
            .unwrap()
            .take()
            .ok_or(LifecycleError::ConfigError(
                "execute_with_result's invocation handler never ran".to_string(),
            ))
    }
}

impl Default for AsyncUnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}
