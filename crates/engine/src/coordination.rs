// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock-guarded task execution per tenant/resource pair
//!
//! Composes the lock manager with a task executor to guarantee at-most-one
//! concurrent execution per resource. Every public method returns a
//! structured result (never an error for task-level failures) so callers
//! can branch on `success` and `error.kind` without exception handling.

use crate::lock::{LockManager, LockOptions};
use chrono::{DateTime, Utc};
use convoy_core::clock::{Clock, SystemClock};
use convoy_core::error::{ErrorInfo, ErrorKind};
use convoy_core::progress::ProgressState;
use convoy_core::task::{TaskConfig, TaskExecutor, TaskRequest};
use convoy_store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lock lifecycle facts for one guarded execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockMetadata {
    pub key: String,
    pub acquired: bool,
    pub released: bool,
    pub hold_duration_ms: u64,
}

/// Timing facts for one guarded execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub retry_count: u32,
}

/// Result of one lock-guarded task execution
///
/// Always produced, success or failure, so callers never need to
/// distinguish "no result" from "failed result".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressState>,
    pub lock_metadata: LockMetadata,
    pub execution_metadata: ExecutionMetadata,
}

impl CoordinationResult {
    /// Overwrite the retry count recorded by an outer retry wrapper
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.execution_metadata.retry_count = retry_count;
        self
    }
}

/// Result of a linear step sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceResult {
    pub success: bool,
    /// Completed prefix of step results; on failure the triggering step's
    /// result is the last element
    pub results: Vec<CoordinationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressState>,
}

/// Serializes task execution per `(tenant, resource)` pair
///
/// Constructed explicitly and passed to call sites; there is no hidden
/// module-level default instance.
#[derive(Clone)]
pub struct CoordinationManager<S, E, C = SystemClock> {
    locks: LockManager<S>,
    executor: E,
    clock: C,
}

impl<S: KeyValueStore, E: TaskExecutor> CoordinationManager<S, E, SystemClock> {
    pub fn new(store: S, executor: E) -> Self {
        Self::with_clock(store, executor, SystemClock)
    }
}

impl<S, E, C> CoordinationManager<S, E, C>
where
    S: KeyValueStore,
    E: TaskExecutor,
    C: Clock,
{
    pub fn with_clock(store: S, executor: E, clock: C) -> Self {
        Self {
            locks: LockManager::new(store),
            executor,
            clock,
        }
    }

    pub fn lock_manager(&self) -> &LockManager<S> {
        &self.locks
    }

    /// Acquire the resource lock, run the task once, and release
    ///
    /// Contention short-circuits with `LockAcquisitionFailed` before the
    /// executor is invoked. Once acquired, release is attempted no matter
    /// how the task ends; a release failure is logged and reflected in
    /// `lock_metadata.released` rather than masking the task outcome.
    pub async fn execute_with_lock(
        &self,
        request: &TaskRequest,
        input: &Value,
        config: &TaskConfig,
        lock_options: &LockOptions,
    ) -> CoordinationResult {
        let started_at = Utc::now();
        let start = self.clock.now();
        let key = self.locks.key(&request.tenant_id, &request.resource_id);

        tracing::debug!(key = %key, task = %config.task_name, "executing under lock");

        let acquisition = match self
            .locks
            .acquire(&request.tenant_id, &request.resource_id, lock_options)
            .await
        {
            Ok(acquisition) => acquisition,
            Err(err) => {
                return self.failure(
                    ErrorInfo::new(
                        ErrorKind::CoordinationError,
                        format!("lock acquisition error: {err}"),
                    ),
                    LockMetadata {
                        key,
                        acquired: false,
                        released: false,
                        hold_duration_ms: 0,
                    },
                    started_at,
                    start,
                );
            }
        };

        if !acquisition.acquired {
            return self.failure(
                ErrorInfo::new(
                    ErrorKind::LockAcquisitionFailed,
                    format!("operation already in progress for {key}"),
                )
                .with_code("E_LOCKED"),
                LockMetadata {
                    key,
                    acquired: false,
                    released: false,
                    hold_duration_ms: 0,
                },
                started_at,
                start,
            );
        }

        let acquired_at = self.clock.now();
        let task_result = self.executor.execute(request, input, config).await;

        let released = match self
            .locks
            .release(&request.tenant_id, &request.resource_id)
            .await
        {
            Ok(removed) => removed,
            Err(err) => {
                // Never mask the task outcome with a cleanup failure
                tracing::warn!(key = %key, error = %err, "lock release failed after task");
                false
            }
        };

        let hold_duration_ms = duration_ms(self.clock.now() - acquired_at);
        let lock_metadata = LockMetadata {
            key,
            acquired: true,
            released,
            hold_duration_ms,
        };

        let error = if task_result.success {
            None
        } else {
            Some(task_result.error.unwrap_or_else(|| {
                ErrorInfo::new(ErrorKind::TaskExecutionFailed, "task reported failure")
            }))
        };

        CoordinationResult {
            success: task_result.success,
            result: task_result.output,
            error,
            progress: task_result.updated_progress,
            lock_metadata,
            execution_metadata: self.execution_metadata(started_at, start),
        }
    }

    /// Run steps strictly in order, threading progress from each step's
    /// output into the next step's input; fail-fast on the first failure
    pub async fn execute_sequence(
        &self,
        request: &TaskRequest,
        input: &Value,
        steps: &[TaskConfig],
        lock_options: &LockOptions,
    ) -> SequenceResult {
        let mut results = Vec::with_capacity(steps.len());
        let mut progress = ProgressState::new(steps.len() as u32);

        for config in steps {
            progress = progress.begin(&config.task_name);
            let step_input = merge_object(input, "progress", &progress);

            let result = self
                .execute_with_lock(request, &step_input, config, lock_options)
                .await;

            if !result.success {
                let error = result.error.clone();
                results.push(result);
                return SequenceResult {
                    success: false,
                    results,
                    error,
                    progress: Some(progress),
                };
            }

            progress = result
                .progress
                .clone()
                .unwrap_or_else(|| progress.advance(&config.task_name));
            results.push(result);
        }

        SequenceResult {
            success: true,
            results,
            error: None,
            progress: Some(progress),
        }
    }

    /// Whether an operation currently holds the resource lock
    pub async fn is_in_progress(
        &self,
        tenant_id: &str,
        resource_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.locks.check(tenant_id, resource_id).await?.is_some())
    }

    /// Force-release a resource lock to unstick a crashed operation
    ///
    /// This is a safety valve, not cooperative cancellation: a still-running
    /// task is not interrupted, only the mutual-exclusion guard is cleared.
    pub async fn cancel(&self, tenant_id: &str, resource_id: &str) -> Result<bool, StoreError> {
        let removed = self.locks.release(tenant_id, resource_id).await?;
        if removed {
            tracing::info!(tenant = %tenant_id, resource = %resource_id, "lock force-released");
        }
        Ok(removed)
    }

    fn failure(
        &self,
        error: ErrorInfo,
        lock_metadata: LockMetadata,
        started_at: DateTime<Utc>,
        start: std::time::Instant,
    ) -> CoordinationResult {
        CoordinationResult {
            success: false,
            result: None,
            error: Some(error),
            progress: None,
            lock_metadata,
            execution_metadata: self.execution_metadata(started_at, start),
        }
    }

    fn execution_metadata(
        &self,
        started_at: DateTime<Utc>,
        start: std::time::Instant,
    ) -> ExecutionMetadata {
        ExecutionMetadata {
            started_at,
            ended_at: Utc::now(),
            duration_ms: duration_ms(self.clock.now() - start),
            retry_count: 0,
        }
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    duration.as_millis() as u64
}

/// Merge a serializable extra field into a JSON object input
///
/// Non-object inputs are wrapped under an `"input"` key first so the step
/// always receives an object.
pub(crate) fn merge_object(input: &Value, key: &str, extra: &impl Serialize) -> Value {
    let mut object = match input {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("input".to_string(), other.clone());
            map
        }
    };
    if let Ok(value) = serde_json::to_value(extra) {
        object.insert(key.to_string(), value);
    }
    Value::Object(object)
}

#[cfg(test)]
#[path = "coordination_tests.rs"]
mod tests;
