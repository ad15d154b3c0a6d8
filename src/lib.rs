//! # tasker-core
//!
//! An asynchronous, phase-ordered Unit-of-Work processing lifecycle engine.
//!
//! A [`ProcessingContext`] drives a message through a sequence of named
//! [`Phase`]s, accumulating handlers and resources along the way, and
//! guarantees deterministic ordering, single-commit semantics, and
//! fan-out of error/completion hooks even when those hooks are registered
//! concurrently with execution. [`AsyncUnitOfWork`] is the façade
//! applications construct and drive; [`ResourceBag`] is the scratch space
//! handlers share within one lifecycle run; [`Scheduler`] is the pluggable
//! executor a context submits its phase handlers to.

mod clock;
mod config;
mod context;
mod error;
mod hook_queue;
mod phase;
mod resource_bag;
mod scheduler;
mod status;
mod unit_of_work;

pub use clock::{Clock, FrozenClock, SystemClock};
pub use config::{DefaultScheduler, ExtraPhase, LifecycleConfig};
pub use context::{
    Action, BoxedUnitFuture, OnErrorAction, ProcessingContext, ProcessingLifecycle,
    WhenCompleteAction,
};
pub use error::{Cause, LifecycleError, LifecycleResult};
pub use phase::{Phase, PhaseTable};
pub use resource_bag::{ResourceBag, ResourceKey};
pub use scheduler::{BoxedTask, InlineScheduler, Scheduler, TokioScheduler};
pub use status::Status;
pub use unit_of_work::{AsyncUnitOfWork, Invocation};
