//! `on_error` registered after the lifecycle has already reached
//! `COMPLETED_ERROR` still fires exactly once, via the "append then
//! try-remove" race protocol (the registrant reclaims its own entry and
//! dispatches it itself, since the completer has no more hooks queued to
//! find it).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tasker_core::{AsyncUnitOfWork, LifecycleError, Phase};

#[tokio::test]
async fn hooks_registered_before_and_after_failure_each_fire_once() {
    let uow = AsyncUnitOfWork::new();
    let early_count = Arc::new(AtomicU32::new(0));
    let late_count = Arc::new(AtomicU32::new(0));

    uow.on(
        Phase::invocation(),
        Arc::new(|_ctx| {
            Box::pin(async { Err(LifecycleError::handler_failure(Phase::invocation(), "boom")) })
        }),
    )
    .unwrap();

    let early_clone = early_count.clone();
    uow.on_error(Arc::new(move |_ctx, _phase, _cause| {
        let count = early_clone.clone();
        Box::pin(async move {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }));

    assert!(uow.execute().await.is_err());
    assert_eq!(early_count.load(Ordering::SeqCst), 1);

    let late_clone = late_count.clone();
    uow.on_error(Arc::new(move |_ctx, _phase, _cause| {
        let count = late_clone.clone();
        Box::pin(async move {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }));

    // Late dispatch is fire-and-forget; give it a chance to run.
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(early_count.load(Ordering::SeqCst), 1);
    assert_eq!(late_count.load(Ordering::SeqCst), 1);
}
