//! calling `execute`/`commit` a second time on the same lifecycle
//! fails with `AlreadyCommitted` rather than re-running any handler.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tasker_core::{AsyncUnitOfWork, LifecycleError, Phase};

#[tokio::test]
async fn second_execute_fails_without_rerunning_handlers() {
    let uow = AsyncUnitOfWork::new();
    let runs = Arc::new(AtomicU32::new(0));
    let runs_clone = runs.clone();

    uow.on(
        Phase::invocation(),
        Arc::new(move |_ctx| {
            let runs = runs_clone.clone();
            Box::pin(async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }),
    )
    .unwrap();

    assert!(uow.execute().await.is_ok());
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let second = uow.execute().await;
    assert!(matches!(second, Err(LifecycleError::AlreadyCommitted)));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}
