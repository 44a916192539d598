// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task executor interface and validated task configuration
//!
//! The coordination core treats task bodies as opaque: a `TaskExecutor`
//! performs one named unit of work and reports success or failure plus the
//! updated progress record. Retries belong to the caller via `RetryPolicy`,
//! not to this interface.

use crate::error::ErrorInfo;
use crate::metadata::MetaMap;
use crate::progress::ProgressState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Identity of the caller and the logical resource being worked on
///
/// The `(tenant_id, resource_id)` pair is the mutual-exclusion domain:
/// lock keys are derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub tenant_id: String,
    pub resource_id: String,
    #[serde(default)]
    pub metadata: MetaMap,
}

impl TaskRequest {
    pub fn new(tenant_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            resource_id: resource_id.into(),
            metadata: MetaMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: MetaMap) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Errors from task configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("task name must not be empty")]
    EmptyTaskName,
    #[error("total steps must be at least 1")]
    ZeroTotalSteps,
}

/// Configuration for one named task
///
/// Constructed through [`TaskConfig::builder`], which validates required
/// fields once at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub task_name: String,
    pub total_steps: u32,
    #[serde(default, with = "humantime_serde::option")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub params: MetaMap,
}

impl TaskConfig {
    pub fn builder(task_name: impl Into<String>) -> TaskConfigBuilder {
        TaskConfigBuilder {
            task_name: task_name.into(),
            total_steps: 1,
            timeout: None,
            params: MetaMap::new(),
        }
    }
}

/// Builder for [`TaskConfig`] with construction-time validation
#[derive(Debug, Clone)]
pub struct TaskConfigBuilder {
    task_name: String,
    total_steps: u32,
    timeout: Option<Duration>,
    params: MetaMap,
}

impl TaskConfigBuilder {
    pub fn total_steps(mut self, total_steps: u32) -> Self {
        self.total_steps = total_steps;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn params(mut self, params: MetaMap) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<TaskConfig, ConfigError> {
        if self.task_name.trim().is_empty() {
            return Err(ConfigError::EmptyTaskName);
        }
        if self.total_steps == 0 {
            return Err(ConfigError::ZeroTotalSteps);
        }
        Ok(TaskConfig {
            task_name: self.task_name,
            total_steps: self.total_steps,
            timeout: self.timeout,
            params: self.params,
        })
    }
}

/// Outcome of a single task execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_progress: Option<ProgressState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl TaskResult {
    pub fn ok(output: serde_json::Value) -> Self {
        Self {
            success: true,
            output: Some(output),
            updated_progress: None,
            error: None,
        }
    }

    pub fn err(error: ErrorInfo) -> Self {
        Self {
            success: false,
            output: None,
            updated_progress: None,
            error: Some(error),
        }
    }

    pub fn with_progress(mut self, progress: ProgressState) -> Self {
        self.updated_progress = Some(progress);
        self
    }
}

/// Executes one named task
///
/// The core awaits completion and never inspects or retries the executor's
/// internal behavior.
#[async_trait]
pub trait TaskExecutor: Send + Sync + 'static {
    async fn execute(
        &self,
        request: &TaskRequest,
        input: &serde_json::Value,
        config: &TaskConfig,
    ) -> TaskResult;
}

#[async_trait]
impl<E: TaskExecutor> TaskExecutor for Arc<E> {
    async fn execute(
        &self,
        request: &TaskRequest,
        input: &serde_json::Value,
        config: &TaskConfig,
    ) -> TaskResult {
        (**self).execute(request, input, config).await
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
