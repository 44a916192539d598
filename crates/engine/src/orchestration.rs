// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency-aware multi-step orchestration
//!
//! Schedules a set of named steps with declared dependencies, executing all
//! currently-runnable steps each round until every step completes, a step
//! fails, or no pending step can make progress (deadlock). Cycle detection
//! is a round-based fixed-point check, not a graph traversal.

use crate::coordination::{merge_object, CoordinationManager, CoordinationResult};
use crate::lock::LockOptions;
use convoy_core::clock::{Clock, SystemClock};
use convoy_core::error::{ErrorInfo, ErrorKind};
use convoy_core::task::{TaskConfig, TaskExecutor, TaskRequest};
use convoy_store::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Lifecycle of one orchestration step
///
/// "Ready" is not a stored state: a pending step is ready iff every
/// declared dependency has completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

/// A named unit of work with declared dependencies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationStep {
    pub step_id: String,
    pub config: TaskConfig,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub status: StepStatus,
}

impl OrchestrationStep {
    pub fn new(step_id: impl Into<String>, config: TaskConfig) -> Self {
        Self {
            step_id: step_id.into(),
            config,
            dependencies: Vec::new(),
            status: StepStatus::Pending,
        }
    }

    pub fn depends_on(mut self, step_id: impl Into<String>) -> Self {
        self.dependencies.push(step_id.into());
        self
    }
}

/// Aggregated outcome of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub success: bool,
    /// Per-step results, read-only once stored
    pub step_results: BTreeMap<String, CoordinationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Step ids completed before termination, in completion order
    pub completed: Vec<String>,
    /// Step ids still pending at termination; non-empty on deadlock
    pub pending: Vec<String>,
    /// Scheduling rounds executed
    pub rounds: u32,
}

/// Schedules dependency-ordered steps on top of the coordination manager
#[derive(Clone)]
pub struct OrchestrationManager<S, E, C = SystemClock> {
    coordination: CoordinationManager<S, E, C>,
    lock_options: LockOptions,
}

impl<S: KeyValueStore, E: TaskExecutor> OrchestrationManager<S, E, SystemClock> {
    pub fn new(store: S, executor: E) -> Self {
        Self::with_clock(store, executor, SystemClock)
    }
}

impl<S, E, C> OrchestrationManager<S, E, C>
where
    S: KeyValueStore,
    E: TaskExecutor,
    C: Clock,
{
    pub fn with_clock(store: S, executor: E, clock: C) -> Self {
        Self {
            coordination: CoordinationManager::with_clock(store, executor, clock),
            lock_options: LockOptions::default(),
        }
    }

    /// Override the lock options applied to every step
    pub fn with_lock_options(mut self, lock_options: LockOptions) -> Self {
        self.lock_options = lock_options;
        self
    }

    /// Single-task and sequence operations remain available on the base
    /// manager
    pub fn coordination(&self) -> &CoordinationManager<S, E, C> {
        &self.coordination
    }

    /// Run a step graph to completion, failure, or deadlock
    ///
    /// Dangling dependency references are rejected up front rather than
    /// surfacing as a runtime deadlock.
    pub async fn execute(
        &self,
        request: &TaskRequest,
        input: &Value,
        steps: &[OrchestrationStep],
    ) -> OrchestrationResult {
        if let Some(error) = validate_graph(steps) {
            return OrchestrationResult {
                success: false,
                step_results: BTreeMap::new(),
                error: Some(error),
                completed: Vec::new(),
                pending: steps.iter().map(|s| s.step_id.clone()).collect(),
                rounds: 0,
            };
        }

        let mut status: HashMap<&str, StepStatus> = steps
            .iter()
            .map(|s| (s.step_id.as_str(), StepStatus::Pending))
            .collect();
        let mut step_results: BTreeMap<String, CoordinationResult> = BTreeMap::new();
        let mut completed: Vec<String> = Vec::new();
        let mut rounds = 0u32;

        while completed.len() < steps.len() {
            // Submission order keeps rounds deterministic
            let runnable: Vec<&OrchestrationStep> = steps
                .iter()
                .filter(|s| status[s.step_id.as_str()] == StepStatus::Pending)
                .filter(|s| {
                    s.dependencies
                        .iter()
                        .all(|d| status.get(d.as_str()) == Some(&StepStatus::Completed))
                })
                .collect();

            if runnable.is_empty() {
                let pending = pending_ids(steps, &status);
                tracing::warn!(
                    pending = ?pending,
                    completed = ?completed,
                    "orchestration deadlocked"
                );
                return OrchestrationResult {
                    success: false,
                    step_results,
                    error: Some(ErrorInfo::new(
                        ErrorKind::OrchestrationDeadlock,
                        format!(
                            "no runnable steps; pending: [{}], completed: [{}]",
                            pending.join(", "),
                            completed.join(", ")
                        ),
                    )),
                    completed,
                    pending,
                    rounds,
                };
            }

            rounds += 1;
            tracing::debug!(round = rounds, steps = runnable.len(), "orchestration round");

            // Steps within a round have no cross-dependency; the reference
            // semantics process them sequentially
            for step in runnable {
                status.insert(step.step_id.as_str(), StepStatus::Running);

                let step_input = self.step_input(input, step, &step_results);
                let result = self
                    .coordination
                    .execute_with_lock(request, &step_input, &step.config, &self.lock_options)
                    .await;

                if !result.success {
                    status.insert(step.step_id.as_str(), StepStatus::Failed);
                    let message = match result.error.as_ref() {
                        Some(inner) => format!("step {} failed: {}", step.step_id, inner.message),
                        None => format!("step {} failed", step.step_id),
                    };
                    step_results.insert(step.step_id.clone(), result);
                    return OrchestrationResult {
                        success: false,
                        step_results,
                        error: Some(ErrorInfo::new(ErrorKind::OrchestrationStepFailed, message)),
                        pending: pending_ids(steps, &status),
                        completed,
                        rounds,
                    };
                }

                status.insert(step.step_id.as_str(), StepStatus::Completed);
                completed.push(step.step_id.clone());
                step_results.insert(step.step_id.clone(), result);
            }
        }

        OrchestrationResult {
            success: true,
            step_results,
            error: None,
            completed,
            pending: Vec::new(),
            rounds,
        }
    }

    /// Step input: global input merged with each dependency's output under
    /// the dependency's step id
    fn step_input(
        &self,
        input: &Value,
        step: &OrchestrationStep,
        step_results: &BTreeMap<String, CoordinationResult>,
    ) -> Value {
        let mut merged = input.clone();
        for dep in &step.dependencies {
            if let Some(result) = step_results.get(dep) {
                let output = result.result.clone().unwrap_or(Value::Null);
                merged = merge_object(&merged, dep, &output);
            }
        }
        merged
    }
}

/// Reject graphs with duplicate step ids or dangling dependency references
fn validate_graph(steps: &[OrchestrationStep]) -> Option<ErrorInfo> {
    let mut ids: HashSet<&str> = HashSet::with_capacity(steps.len());
    for step in steps {
        if !ids.insert(step.step_id.as_str()) {
            return Some(ErrorInfo::new(
                ErrorKind::OrchestrationInvalidGraph,
                format!("duplicate step id: {}", step.step_id),
            ));
        }
    }
    for step in steps {
        for dep in &step.dependencies {
            if !ids.contains(dep.as_str()) {
                return Some(ErrorInfo::new(
                    ErrorKind::OrchestrationInvalidGraph,
                    format!(
                        "step {} depends on undeclared step {}",
                        step.step_id, dep
                    ),
                ));
            }
        }
    }
    None
}

fn pending_ids(steps: &[OrchestrationStep], status: &HashMap<&str, StepStatus>) -> Vec<String> {
    steps
        .iter()
        .filter(|s| status.get(s.step_id.as_str()) == Some(&StepStatus::Pending))
        .map(|s| s.step_id.clone())
        .collect()
}

#[cfg(test)]
#[path = "orchestration_tests.rs"]
mod tests;
