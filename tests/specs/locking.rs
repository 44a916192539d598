//! Mutual exclusion and TTL behavior through the public API

use crate::prelude::*;
use std::time::Duration;

fn echo_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register("echo", |_request, input, _config| async move {
        TaskResult::ok(input)
    });
    registry
}

#[tokio::test]
async fn lock_expires_without_explicit_release() {
    let (manager, clock) = coordination(echo_registry());
    let locks = manager.lock_manager();
    let options = LockOptions::default().with_ttl(Duration::from_secs(5));

    // t=0: first caller wins
    assert!(locks.acquire("u1", "t1", &options).await.unwrap().acquired);

    // t=1: contention
    clock.advance_secs(1);
    assert!(!locks.acquire("u1", "t1", &options).await.unwrap().acquired);

    // t=6: TTL elapsed, lock is reacquirable
    clock.advance_secs(5);
    assert!(locks.acquire("u1", "t1", &options).await.unwrap().acquired);
}

#[tokio::test]
async fn contention_is_distinguishable_from_task_failure() {
    let mut registry = echo_registry();
    registry.register("broken", |_request, _input, _config| async move {
        TaskResult::err(ErrorInfo::new(ErrorKind::TaskExecutionFailed, "render failed"))
    });

    let (manager, _clock) = coordination(registry);
    let request = TaskRequest::new("u1", "t1");

    // A task failure reports TaskExecutionFailed
    let failed = manager
        .execute_with_lock(&request, &json!({}), &config("broken"), &LockOptions::default())
        .await;
    assert_eq!(
        failed.error.as_ref().map(|e| e.kind),
        Some(ErrorKind::TaskExecutionFailed)
    );

    // Contention on a held lock reports LockAcquisitionFailed, so a UI can
    // show "already running" instead of "failed"
    manager
        .lock_manager()
        .acquire("u1", "t1", &LockOptions::default())
        .await
        .unwrap();
    let contended = manager
        .execute_with_lock(&request, &json!({}), &config("echo"), &LockOptions::default())
        .await;
    assert_eq!(
        contended.error.as_ref().map(|e| e.kind),
        Some(ErrorKind::LockAcquisitionFailed)
    );
}

#[tokio::test]
async fn cancel_unblocks_a_resource_after_a_crash() {
    let (manager, _clock) = coordination(echo_registry());
    let request = TaskRequest::new("u1", "t1");

    // A crashed holder left its lock behind
    manager
        .lock_manager()
        .acquire("u1", "t1", &LockOptions::default())
        .await
        .unwrap();
    assert!(manager.is_in_progress("u1", "t1").await.unwrap());

    // Safety valve: force-release, then work proceeds
    assert!(manager.cancel("u1", "t1").await.unwrap());

    let result = manager
        .execute_with_lock(&request, &json!({"x": 1}), &config("echo"), &LockOptions::default())
        .await;
    assert!(result.success);
}

#[tokio::test]
async fn tenants_do_not_contend_with_each_other() {
    let (manager, _clock) = coordination(echo_registry());

    let first = manager
        .execute_with_lock(
            &TaskRequest::new("u1", "t1"),
            &json!({}),
            &config("echo"),
            &LockOptions::default(),
        )
        .await;
    let second = manager
        .execute_with_lock(
            &TaskRequest::new("u2", "t1"),
            &json!({}),
            &config("echo"),
            &LockOptions::default(),
        )
        .await;

    assert!(first.success);
    assert!(second.success);
    assert_eq!(first.lock_metadata.key, "run:u1:t1");
    assert_eq!(second.lock_metadata.key, "run:u2:t1");
}
