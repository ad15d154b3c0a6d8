//! # Scheduler
//!
//! The pluggable executor abstraction a `ProcessingContext` submits its
//! phase handlers to. Object-safe and `Send + Sync`, the same shape
//! `tasker_shared::resilience::CircuitBreakerBehavior` gives its strategy
//! trait: a small uniform interface with more than one concrete backend.
//!
//! The default is `InlineScheduler`, which runs submitted work on the
//! calling task before returning — so by default the engine is single-
//! threaded cooperative. `TokioScheduler` spawns each submission so a
//! bucket's handlers run in parallel.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::{LifecycleError, LifecycleResult};
use crate::phase::Phase;

/// A boxed, type-erased unit of async work submitted to a `Scheduler`.
pub type BoxedTask = Pin<Box<dyn Future<Output = LifecycleResult<()>> + Send>>;

/// An executor abstraction that runs submitted tasks to completion.
///
/// `submit` returns a future that resolves when the submitted task has
/// finished; the `Scheduler` is free to run it inline, on a thread pool, or
/// anywhere else, as long as the returned future only resolves after the
/// task is done.
#[async_trait]
pub trait Scheduler: Send + Sync + std::fmt::Debug {
    async fn submit(&self, task: BoxedTask) -> LifecycleResult<()>;
}

/// Runs submitted tasks on the calling task. The default scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

#[async_trait]
impl Scheduler for InlineScheduler {
    async fn submit(&self, task: BoxedTask) -> LifecycleResult<()> {
        task.await
    }
}

/// Spawns each submission onto the ambient Tokio runtime, so handlers
/// within the same bucket run in parallel.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn submit(&self, task: BoxedTask) -> LifecycleResult<()> {
        match tokio::spawn(task).await {
            Ok(result) => result,
            Err(join_error) => Err(LifecycleError::handler_panicked(
                Phase::new("UNKNOWN", 0),
                join_error.to_string(),
            )),
        }
    }
}
