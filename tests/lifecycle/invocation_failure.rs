//! a failure during `INVOCATION` aborts every later phase and fires
//! `on_error` instead of `when_complete`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tasker_core::{AsyncUnitOfWork, LifecycleError, Phase};

#[tokio::test]
async fn failure_skips_later_phases_and_fires_on_error_only() {
    let uow = AsyncUnitOfWork::new();
    let post_invocation_ran = Arc::new(AtomicBool::new(false));
    let commit_ran = Arc::new(AtomicBool::new(false));
    let when_complete_ran = Arc::new(AtomicBool::new(false));
    let on_error_ran = Arc::new(AtomicBool::new(false));

    uow.on(
        Phase::invocation(),
        Arc::new(|_ctx| {
            Box::pin(async {
                Err(LifecycleError::handler_failure(Phase::invocation(), "invocation exploded"))
            })
        }),
    )
    .unwrap();

    let post_invocation_ran_clone = post_invocation_ran.clone();
    uow.on(
        Phase::post_invocation(),
        Arc::new(move |_ctx| {
            let flag = post_invocation_ran_clone.clone();
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
        }),
    )
    .unwrap();

    let commit_ran_clone = commit_ran.clone();
    uow.on(
        Phase::commit(),
        Arc::new(move |_ctx| {
            let flag = commit_ran_clone.clone();
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
        }),
    )
    .unwrap();

    let when_complete_ran_clone = when_complete_ran.clone();
    uow.when_complete(Arc::new(move |_ctx| {
        let flag = when_complete_ran_clone.clone();
        Box::pin(async move {
            flag.store(true, Ordering::SeqCst);
        })
    }));

    let on_error_ran_clone = on_error_ran.clone();
    uow.on_error(Arc::new(move |_ctx, phase, cause| {
        let flag = on_error_ran_clone.clone();
        let phase_name = phase.name().to_string();
        Box::pin(async move {
            assert_eq!(phase_name, "INVOCATION");
            assert!(cause.to_string().contains("invocation exploded"));
            flag.store(true, Ordering::SeqCst);
        })
    }));

    let result = uow.execute().await;

    assert!(result.is_err());
    assert!(!post_invocation_ran.load(Ordering::SeqCst));
    assert!(!commit_ran.load(Ordering::SeqCst));
    assert!(!when_complete_ran.load(Ordering::SeqCst));
    assert!(on_error_ran.load(Ordering::SeqCst));
}
