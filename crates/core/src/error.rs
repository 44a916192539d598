// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured error kinds carried by coordination results
//!
//! Public manager methods return results rather than raising, so every
//! failure carries a kind the caller can branch on ("already running" vs.
//! "failed").

use serde::{Deserialize, Serialize};

/// Classification of a coordination failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Lock contention: another holder owns the resource
    LockAcquisitionFailed,
    /// The task executor reported a failure
    TaskExecutionFailed,
    /// No pending step's dependencies are satisfiable (cycle or dangling)
    OrchestrationDeadlock,
    /// A step failed and aborted the whole orchestration
    OrchestrationStepFailed,
    /// A step graph was rejected at submission time
    OrchestrationInvalidGraph,
    /// Unexpected failure during a critical section
    CoordinationError,
}

impl ErrorKind {
    /// Whether a caller may reasonably retry after this failure
    ///
    /// Graph-level failures are never retryable: they indicate a bad step
    /// definition that must be fixed by the caller.
    pub fn is_retryable(self) -> bool {
        match self {
            ErrorKind::LockAcquisitionFailed
            | ErrorKind::TaskExecutionFailed
            | ErrorKind::CoordinationError => true,
            ErrorKind::OrchestrationDeadlock
            | ErrorKind::OrchestrationStepFailed
            | ErrorKind::OrchestrationInvalidGraph => false,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::LockAcquisitionFailed => "lock acquisition failed",
            ErrorKind::TaskExecutionFailed => "task execution failed",
            ErrorKind::OrchestrationDeadlock => "orchestration deadlock",
            ErrorKind::OrchestrationStepFailed => "orchestration step failed",
            ErrorKind::OrchestrationInvalidGraph => "invalid orchestration graph",
            ErrorKind::CoordinationError => "coordination error",
        };
        write!(f, "{name}")
    }
}

/// A structured error payload attached to failed results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ErrorInfo {}
