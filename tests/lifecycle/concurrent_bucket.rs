//! multiple handlers registered at the same phase order form one
//! bucket and run concurrently under a pool-backed `TokioScheduler`; a
//! failing handler does not stop its bucket-mates from completing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tasker_core::{AsyncUnitOfWork, LifecycleError, Phase, TokioScheduler};

#[tokio::test]
async fn bucket_mates_all_run_even_when_one_fails() {
    let uow = AsyncUnitOfWork::with_scheduler("concurrent", Arc::new(TokioScheduler));
    let completed = Arc::new(AtomicU32::new(0));

    for i in 0..8 {
        let completed_clone = completed.clone();
        uow.on(
            Phase::invocation(),
            Arc::new(move |_ctx| {
                let completed = completed_clone.clone();
                Box::pin(async move {
                    if i == 3 {
                        return Err(LifecycleError::handler_failure(
                            Phase::invocation(),
                            "handler 3 fails",
                        ));
                    }
                    completed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            }),
        )
        .unwrap();
    }

    let result = uow.execute().await;
    assert!(result.is_err());
    assert_eq!(completed.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn first_failure_in_a_bucket_is_the_one_recorded() {
    let uow = AsyncUnitOfWork::with_scheduler("concurrent-first-failure", Arc::new(TokioScheduler));

    uow.on(
        Phase::invocation(),
        Arc::new(|_ctx| {
            Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                Err(LifecycleError::handler_failure(Phase::invocation(), "slow failure"))
            })
        }),
    )
    .unwrap();

    uow.on(
        Phase::invocation(),
        Arc::new(|_ctx| {
            Box::pin(async { Err(LifecycleError::handler_failure(Phase::invocation(), "fast failure")) })
        }),
    )
    .unwrap();

    let result = uow.execute().await;
    assert!(result.is_err());
}
