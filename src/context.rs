//! # Processing Context
//!
//! The running instance of a Unit of Work: holds per-phase handler buckets,
//! the current-phase cursor, the status word, the first-recorded failure,
//! the resource bag, and the terminal-hook queues. Mutated only by
//! registrations and the internal drain loop; reaches a terminal state
//! exactly once.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock};

use arc_swap::ArcSwapOption;
use futures::future::join_all;
use futures::FutureExt;
use tracing::{debug, info, instrument, warn};

use crate::config::LifecycleConfig;
use crate::error::{Cause, LifecycleError, LifecycleResult};
use crate::hook_queue::HookQueue;
use crate::phase::Phase;
use crate::resource_bag::ResourceBag;
use crate::scheduler::{BoxedTask, Scheduler};
use crate::status::AtomicStatus;

/// A boxed future yielding nothing, used by terminal hooks.
pub type BoxedUnitFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A phase handler: `(ctx) -> future<unit-or-failure>`.
pub type Action = Arc<dyn Fn(Arc<ProcessingContext>) -> BoxedTask + Send + Sync>;

/// An `on_error` terminal hook: `(ctx, phase_where_failed, cause) -> unit`.
pub type OnErrorAction =
    Arc<dyn Fn(Arc<ProcessingContext>, Phase, Cause) -> BoxedUnitFuture + Send + Sync>;

/// A `when_complete` terminal hook: `(ctx) -> unit`.
pub type WhenCompleteAction = Arc<dyn Fn(Arc<ProcessingContext>) -> BoxedUnitFuture + Send + Sync>;

/// The capability surface a `ProcessingContext` exposes for registering
/// handlers and terminal hooks. A capability layering, not an OO hierarchy
/// — `ProcessingContext` implements it directly.
pub trait ProcessingLifecycle {
    /// Register `action` to run during `phase`. Fails synchronously with
    /// `LifecycleError::TooLate` if `phase` has already started or passed.
    fn on(self: &Arc<Self>, phase: Phase, action: Action) -> LifecycleResult<()>;

    /// Register a hook that fires exactly once when the lifecycle reaches
    /// `COMPLETED_ERROR`, with the first recorded `(phase, cause)`.
    fn on_error(self: &Arc<Self>, handler: OnErrorAction);

    /// Register a hook that fires exactly once when the lifecycle reaches
    /// `COMPLETED_OK`.
    fn when_complete(self: &Arc<Self>, handler: WhenCompleteAction);
}

/// The running instance of a Unit of Work.
pub struct ProcessingContext {
    identifier: String,
    phase_handlers: Mutex<BTreeMap<i32, Vec<(Phase, Action)>>>,
    current_phase: ArcSwapOption<Phase>,
    status: AtomicStatus,
    error_cause: OnceLock<(Phase, Cause)>,
    on_error_queue: HookQueue<OnErrorAction>,
    when_complete_queue: HookQueue<WhenCompleteAction>,
    resources: ResourceBag,
    scheduler: Arc<dyn Scheduler>,
    config: Arc<LifecycleConfig>,
}

impl fmt::Debug for ProcessingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingContext")
            .field("identifier", &self.identifier)
            .field("status", &self.status.load())
            .field("current_phase", &self.current_phase.load_full())
            .finish()
    }
}

impl ProcessingContext {
    /// Construct a new, empty context with the default configuration.
    pub fn new(identifier: impl Into<String>, scheduler: Arc<dyn Scheduler>) -> Arc<Self> {
        Self::with_config(identifier, scheduler, Arc::new(LifecycleConfig::default()))
    }

    /// Construct a new, empty context governed by `config`: default phase
    /// table extensions, hook-panic-swallowing toggle.
    pub fn with_config(
        identifier: impl Into<String>,
        scheduler: Arc<dyn Scheduler>,
        config: Arc<LifecycleConfig>,
    ) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.into(),
            phase_handlers: Mutex::new(BTreeMap::new()),
            current_phase: ArcSwapOption::empty(),
            status: AtomicStatus::new(),
            error_cause: OnceLock::new(),
            on_error_queue: HookQueue::new(),
            when_complete_queue: HookQueue::new(),
            resources: ResourceBag::new(),
            scheduler,
            config,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn resources(&self) -> &ResourceBag {
        &self.resources
    }

    pub fn is_started(&self) -> bool {
        self.status.is_started()
    }

    pub fn is_committed(&self) -> bool {
        self.status.is_committed()
    }

    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Atomically CAS `NOT_STARTED -> STARTED`, drain every phase bucket in
    /// ascending order, then fan out the matching terminal hooks. Resolves
    /// with the original failure, if any.
    #[instrument(skip(self), fields(lifecycle_id = %self.identifier))]
    pub async fn commit(self: &Arc<Self>) -> LifecycleResult<()> {
        if !self.status.try_start() {
            return Err(LifecycleError::AlreadyCommitted);
        }
        info!(lifecycle_id = %self.identifier, "unit of work started");

        let result = self.drain_all().await;
        match &result {
            Ok(()) => {
                self.status.complete_ok();
                info!(lifecycle_id = %self.identifier, "unit of work completed");
                self.fan_out_when_complete().await;
            }
            Err(_) => {
                self.status.complete_error();
                let (phase, cause) = self
                    .error_cause
                    .get()
                    .cloned()
                    .expect("error_cause is recorded before drain_all returns Err");
                warn!(
                    lifecycle_id = %self.identifier,
                    phase = %phase,
                    error = %cause,
                    "unit of work failed"
                );
                self.fan_out_on_error(phase, cause).await;
            }
        }
        result
    }

    async fn drain_all(self: &Arc<Self>) -> LifecycleResult<()> {
        loop {
            let next = {
                let mut buckets = self.phase_handlers.lock().unwrap();
                let Some(order) = buckets.keys().next().copied() else {
                    break;
                };
                buckets.remove(&order)
            };
            let Some(handlers) = next else { break };
            if handlers.is_empty() {
                continue;
            }

            let representative = handlers[0].0.clone();
            self.current_phase.store(Some(Arc::new(representative.clone())));
            debug!(
                lifecycle_id = %self.identifier,
                phase = %representative,
                handler_count = handlers.len(),
                "entering phase bucket"
            );

            if let Err(err) = self.run_bucket(handlers).await {
                self.current_phase.store(Some(Arc::new(Self::terminal_sentinel())));
                return Err(err);
            }
        }
        self.current_phase.store(Some(Arc::new(Self::terminal_sentinel())));
        Ok(())
    }

    /// A phase ordered past every real phase, stored as `current_phase` once
    /// draining finishes (successfully or not) so that late registrations —
    /// including against a lifecycle with no registered phases at all — are
    /// uniformly rejected as too late rather than silently accepted because
    /// `current_phase` happened to still be `None`.
    fn terminal_sentinel() -> Phase {
        Phase::new("__TERMINAL__", i32::MAX)
    }

    async fn run_bucket(self: &Arc<Self>, handlers: Vec<(Phase, Action)>) -> LifecycleResult<()> {
        let mut submissions = Vec::with_capacity(handlers.len());
        for (phase, action) in handlers {
            let ctx = self.clone();
            let task: BoxedTask = Box::pin(async move { ctx.invoke_handler(phase, action).await });
            submissions.push(self.scheduler.submit(task));
        }

        let results = join_all(submissions).await;
        if results.iter().any(Result::is_err) {
            let (_, cause) = self
                .error_cause
                .get()
                .cloned()
                .expect("a failing handler always records error_cause before returning");
            Err((*cause).clone())
        } else {
            Ok(())
        }
    }

    /// Wraps a single handler invocation safely: converts a
    /// panic into a failed result, records the first failure into
    /// `error_cause`, and re-emits the handler's own failure (composition
    /// preserves cause) regardless of whether it won the race to be
    /// recorded.
    async fn invoke_handler(self: Arc<Self>, phase: Phase, action: Action) -> LifecycleResult<()> {
        let ctx = self.clone();
        let outcome = AssertUnwindSafe((action)(ctx)).catch_unwind().await;
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                self.record_failure(phase, Arc::new(err.clone()));
                Err(err)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                let err = LifecycleError::handler_panicked(phase.clone(), message);
                self.record_failure(phase, Arc::new(err.clone()));
                Err(err)
            }
        }
    }

    fn record_failure(&self, phase: Phase, cause: Cause) {
        if self.error_cause.set((phase.clone(), cause.clone())).is_err() {
            warn!(
                lifecycle_id = %self.identifier,
                phase = %phase,
                error = %cause,
                "additional handler failure after first cause already recorded"
            );
        }
    }

    async fn fan_out_when_complete(self: &Arc<Self>) {
        while let Some(hook) = self.when_complete_queue.pop() {
            self.run_when_complete_hook(hook).await;
        }
    }

    async fn fan_out_on_error(self: &Arc<Self>, phase: Phase, cause: Cause) {
        while let Some(hook) = self.on_error_queue.pop() {
            self.run_on_error_hook(hook, phase.clone(), cause.clone()).await;
        }
    }

    async fn run_when_complete_hook(self: &Arc<Self>, hook: WhenCompleteAction) {
        let ctx = self.clone();
        if let Err(panic) = AssertUnwindSafe((hook)(ctx)).catch_unwind().await {
            self.handle_hook_panic("when_complete", panic);
        }
    }

    async fn run_on_error_hook(self: &Arc<Self>, hook: OnErrorAction, phase: Phase, cause: Cause) {
        let ctx = self.clone();
        if let Err(panic) = AssertUnwindSafe((hook)(ctx, phase, cause)).catch_unwind().await {
            self.handle_hook_panic("on_error", panic);
        }
    }

    /// A terminal hook is never allowed to take the engine down with it:
    /// by default the panic is logged and swallowed. Setting
    /// `LifecycleConfig::swallow_hook_panics` to `false` instead re-raises
    /// it immediately, for tests that want a buggy hook to fail loudly
    /// rather than be silently absorbed.
    fn handle_hook_panic(&self, hook_kind: &'static str, panic: Box<dyn std::any::Any + Send>) {
        if self.config.swallow_hook_panics {
            warn!(
                lifecycle_id = %self.identifier,
                hook_kind,
                "{} hook panicked: {}",
                hook_kind,
                panic_message(panic.as_ref())
            );
        } else {
            std::panic::resume_unwind(panic);
        }
    }

    /// Dispatch a reclaimed hook via the work scheduler without blocking the
    /// synchronous registration call that reclaimed it: terminal hook
    /// dispatch is fire-and-forget.
    fn dispatch_detached<F>(self: &Arc<Self>, run: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let scheduler = self.scheduler.clone();
        tokio::spawn(async move {
            let task: BoxedTask = Box::pin(async move {
                run.await;
                Ok(())
            });
            let _ = scheduler.submit(task).await;
        });
    }
}

impl ProcessingLifecycle for ProcessingContext {
    fn on(self: &Arc<Self>, phase: Phase, action: Action) -> LifecycleResult<()> {
        if let Some(current) = self.current_phase.load_full() {
            if phase.order() <= current.order() {
                return Err(LifecycleError::too_late(phase, (*current).clone()));
            }
        }
        let mut buckets = self.phase_handlers.lock().unwrap();
        buckets.entry(phase.order()).or_default().push((phase, action));
        Ok(())
    }

    fn on_error(self: &Arc<Self>, handler: OnErrorAction) {
        let id = self.on_error_queue.push(handler);
        if self.status.is_error() {
            if let Some(claimed) = self.on_error_queue.try_claim(id) {
                let (phase, cause) = self
                    .error_cause
                    .get()
                    .cloned()
                    .expect("error_cause is recorded whenever status is COMPLETED_ERROR");
                let ctx = self.clone();
                self.dispatch_detached(async move {
                    ctx.run_on_error_hook(claimed, phase, cause).await;
                });
            }
        }
    }

    fn when_complete(self: &Arc<Self>, handler: WhenCompleteAction) {
        let id = self.when_complete_queue.push(handler);
        if self.status.is_completed_ok() {
            if let Some(claimed) = self.when_complete_queue.try_claim(id) {
                let ctx = self.clone();
                self.dispatch_detached(async move {
                    ctx.run_when_complete_hook(claimed).await;
                });
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked with a non-string payload".to_string()
    }
}
