//! registering a handler for a phase that has already started or
//! passed is rejected synchronously with `TooLate`, including against a
//! lifecycle that registered no phases at all.

use std::sync::Arc;

use tasker_core::{AsyncUnitOfWork, LifecycleError, Phase};

#[tokio::test]
async fn registering_a_passed_phase_after_commit_is_rejected() {
    let uow = AsyncUnitOfWork::new();
    uow.on(Phase::commit(), Arc::new(|_ctx| Box::pin(async { Ok(()) })))
        .unwrap();
    uow.execute().await.unwrap();

    let result = uow.on(Phase::invocation(), Arc::new(|_ctx| Box::pin(async { Ok(()) })));
    assert!(matches!(result, Err(LifecycleError::TooLate { .. })));
}

#[tokio::test]
async fn registering_anything_after_an_empty_commit_is_rejected() {
    let uow = AsyncUnitOfWork::new();
    uow.execute().await.unwrap();

    let result = uow.on(Phase::after_commit(), Arc::new(|_ctx| Box::pin(async { Ok(()) })));
    assert!(matches!(result, Err(LifecycleError::TooLate { .. })));
}
