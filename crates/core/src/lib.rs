// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! convoy-core: Core types for the convoy coordination engine
//!
//! This crate provides:
//! - Typed metadata values and progress state (CSI) records
//! - The `TaskExecutor` trait and validated task configuration
//! - Structured error kinds shared by every coordination result
//! - A generic retry-with-backoff policy
//! - Clock abstraction for testable TTL and duration handling

pub mod clock;
pub mod error;
pub mod metadata;
pub mod progress;
pub mod retry;
pub mod task;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{ErrorInfo, ErrorKind};
pub use metadata::{MetaMap, MetaValue};
pub use progress::{ProgressState, STEP_COMPLETED, STEP_PENDING};
pub use retry::{BackoffConfig, RetryPolicy};
pub use task::{ConfigError, TaskConfig, TaskConfigBuilder, TaskExecutor, TaskRequest, TaskResult};
