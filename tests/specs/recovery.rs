//! Retry policy wrapped around lock-guarded execution

use crate::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Registry whose task fails `failures` times before succeeding
fn flaky_registry(failures: u32) -> (HandlerRegistry, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let mut registry = HandlerRegistry::new();
    registry.register("flaky", move |_request, _input, _config| {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < failures {
                TaskResult::err(ErrorInfo::new(
                    ErrorKind::TaskExecutionFailed,
                    "transient upstream error",
                ))
            } else {
                TaskResult::ok(json!("recovered"))
            }
        }
    });
    (registry, calls)
}

/// Retries belong to the caller: the coordination layer runs the task once
/// per call, and a `RetryPolicy` around it recovers from transient failures.
#[tokio::test]
async fn retry_policy_recovers_transient_task_failures() {
    let (registry, calls) = flaky_registry(2);
    let (manager, _clock) = coordination(registry);
    let request = TaskRequest::new("u1", "t1");

    let policy: RetryPolicy<ErrorInfo> = RetryPolicy::new(3)
        .with_backoff(BackoffConfig::none())
        .with_classifier(|e: &ErrorInfo| e.kind.is_retryable())
        .with_kind(|e: &ErrorInfo| e.kind.to_string());

    let attempts = Arc::new(AtomicU32::new(0));
    let attempt_counter = attempts.clone();

    let result = policy
        .run(|| {
            let manager = &manager;
            let request = &request;
            let attempt_counter = attempt_counter.clone();
            async move {
                attempt_counter.fetch_add(1, Ordering::SeqCst);
                let outcome = manager
                    .execute_with_lock(
                        request,
                        &json!({}),
                        &config("flaky"),
                        &LockOptions::default(),
                    )
                    .await;
                match outcome.success {
                    true => Ok(outcome),
                    false => Err(outcome.error.unwrap_or_else(|| {
                        ErrorInfo::new(ErrorKind::CoordinationError, "missing error")
                    })),
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(result.result, Some(json!("recovered")));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // The caller can record how many retries the result cost
    let result = result.with_retry_count(attempts.load(Ordering::SeqCst) - 1);
    assert_eq!(result.execution_metadata.retry_count, 2);

    // Each attempt released its lock, including the failed ones
    assert!(!manager.is_in_progress("u1", "t1").await.unwrap());
}

#[tokio::test]
async fn deadlock_errors_are_not_retried() {
    let (manager, _clock) = orchestration(HandlerRegistry::new());
    let request = TaskRequest::new("u1", "t1");
    let steps = vec![step("a").depends_on("b"), step("b").depends_on("a")];

    let policy: RetryPolicy<ErrorInfo> = RetryPolicy::new(5)
        .with_backoff(BackoffConfig::none())
        .with_classifier(|e: &ErrorInfo| e.kind.is_retryable());

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result: Result<(), ErrorInfo> = policy
        .run(|| {
            let manager = &manager;
            let request = &request;
            let steps = &steps;
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let outcome = manager.execute(request, &json!({}), steps).await;
                match outcome.error {
                    Some(error) => Err(error),
                    None => Ok(()),
                }
            }
        })
        .await;

    // A cyclic graph is a definition bug; retrying cannot fix it
    assert_eq!(result.unwrap_err().kind, ErrorKind::OrchestrationDeadlock);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
