//! a lifecycle that registers handlers across several phases plus both
//! terminal hooks, drives it with `execute_with_result`, and asserts the
//! hooks fired in the right order relative to the handlers and to each
//! other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use tasker_core::{AsyncUnitOfWork, Phase};

#[tokio::test]
async fn handlers_and_hooks_run_in_phase_order_then_fan_out() {
    let uow = AsyncUnitOfWork::new();
    let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));

    let log_pre = log.clone();
    uow.on(
        Phase::pre_invocation(),
        Arc::new(move |_ctx| {
            let log = log_pre.clone();
            Box::pin(async move {
                log.lock().await.push("pre_invocation");
                Ok(())
            })
        }),
    )
    .unwrap();

    let log_post = log.clone();
    uow.on(
        Phase::post_invocation(),
        Arc::new(move |_ctx| {
            let log = log_post.clone();
            Box::pin(async move {
                log.lock().await.push("post_invocation");
                Ok(())
            })
        }),
    )
    .unwrap();

    let log_commit = log.clone();
    uow.on(
        Phase::commit(),
        Arc::new(move |_ctx| {
            let log = log_commit.clone();
            Box::pin(async move {
                log.lock().await.push("commit");
                Ok(())
            })
        }),
    )
    .unwrap();

    let on_error_ran = Arc::new(AtomicBool::new(false));
    let on_error_ran_clone = on_error_ran.clone();
    uow.on_error(Arc::new(move |_ctx, _phase, _cause| {
        let flag = on_error_ran_clone.clone();
        Box::pin(async move {
            flag.store(true, Ordering::SeqCst);
        })
    }));

    let log_complete = log.clone();
    uow.when_complete(Arc::new(move |_ctx| {
        let log = log_complete.clone();
        Box::pin(async move {
            log.lock().await.push("when_complete");
        })
    }));

    let result = uow
        .execute_with_result::<u32>(
            Phase::invocation(),
            Arc::new(|_ctx| Box::pin(async { Ok(7) })),
        )
        .await
        .unwrap();

    assert_eq!(result, 7);
    assert!(!on_error_ran.load(Ordering::SeqCst));
    assert_eq!(
        *log.lock().await,
        vec!["pre_invocation", "post_invocation", "commit", "when_complete"]
    );
}
