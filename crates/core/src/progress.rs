// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress state (CSI) threaded through every workflow step
//!
//! Progress records are updated immutably: each completed step produces a new
//! record. `current_progress` never decreases within a run and
//! `completed_steps` never exceeds `total_steps`.

use crate::metadata::{MetaMap, MetaValue};
use serde::{Deserialize, Serialize};

/// Initial value of `current_step` before any step has run
pub const STEP_PENDING: &str = "pending";

/// Terminal value of `current_step` once every step has completed
pub const STEP_COMPLETED: &str = "completed";

/// Running record of workflow progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Names of completed steps, in completion order (append-only)
    pub completed_steps: Vec<String>,
    /// Overall percentage, 0-100
    pub current_progress: u8,
    /// Total number of steps in the workflow
    pub total_steps: u32,
    /// Name of the step currently executing, or a terminal marker
    pub current_step: String,
    #[serde(default)]
    pub metadata: MetaMap,
}

impl ProgressState {
    /// Create a fresh record for a workflow with the given number of steps
    pub fn new(total_steps: u32) -> Self {
        Self {
            completed_steps: Vec::new(),
            current_progress: 0,
            total_steps: total_steps.max(1),
            current_step: STEP_PENDING.to_string(),
            metadata: MetaMap::new(),
        }
    }

    /// Mark a step as currently executing without completing it
    pub fn begin(&self, step: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.current_step = step.into();
        next
    }

    /// Record a completed step, returning the updated state
    ///
    /// A step name already present in `completed_steps` is not recorded
    /// twice, so re-running a step cannot overflow the step count.
    pub fn advance(&self, step: impl Into<String>) -> Self {
        let step = step.into();
        let mut next = self.clone();

        if !next.completed_steps.contains(&step)
            && (next.completed_steps.len() as u32) < next.total_steps
        {
            next.completed_steps.push(step.clone());
        }

        let pct = Self::percent(next.completed_steps.len() as u32, next.total_steps);
        next.current_progress = next.current_progress.max(pct);
        next.current_step = if next.is_terminal() {
            STEP_COMPLETED.to_string()
        } else {
            step
        };
        next
    }

    /// Attach a metadata entry, returning the updated state
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        let mut next = self.clone();
        next.metadata.insert(key.into(), value.into());
        next
    }

    /// Whether every step has completed
    pub fn is_terminal(&self) -> bool {
        self.current_step == STEP_COMPLETED
            || self.completed_steps.len() as u32 >= self.total_steps
    }

    fn percent(completed: u32, total: u32) -> u8 {
        let total = total.max(1);
        let pct = (u64::from(completed) * 100) / u64::from(total);
        pct.min(100) as u8
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
