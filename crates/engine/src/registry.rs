// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference task executor backed by a handler registry
//!
//! Maps task names to async handler functions. Production deployments plug
//! in their own [`TaskExecutor`] (an LLM call, a render job); this one is
//! the sample implementation and the executor the test suites use.

use async_trait::async_trait;
use convoy_core::error::{ErrorInfo, ErrorKind};
use convoy_core::task::{TaskConfig, TaskExecutor, TaskRequest, TaskResult};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

type BoxedTaskFuture = Pin<Box<dyn Future<Output = TaskResult> + Send>>;
type TaskHandler = Box<dyn Fn(TaskRequest, Value, TaskConfig) -> BoxedTaskFuture + Send + Sync>;

/// Dispatches tasks to registered handlers by task name
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, TaskHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a task name, replacing any existing one
    pub fn register<F, Fut>(&mut self, task_name: impl Into<String>, handler: F)
    where
        F: Fn(TaskRequest, Value, TaskConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        self.handlers.insert(
            task_name.into(),
            Box::new(move |request, input, config| Box::pin(handler(request, input, config))),
        );
    }

    pub fn contains(&self, task_name: &str) -> bool {
        self.handlers.contains_key(task_name)
    }
}

#[async_trait]
impl TaskExecutor for HandlerRegistry {
    async fn execute(
        &self,
        request: &TaskRequest,
        input: &Value,
        config: &TaskConfig,
    ) -> TaskResult {
        match self.handlers.get(&config.task_name) {
            Some(handler) => handler(request.clone(), input.clone(), config.clone()).await,
            None => TaskResult::err(
                ErrorInfo::new(
                    ErrorKind::TaskExecutionFailed,
                    format!("no handler registered for task {}", config.task_name),
                )
                .with_code("E_NO_HANDLER"),
            ),
        }
    }
}
