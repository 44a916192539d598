// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! convoy-engine: Lock-guarded task coordination and orchestration
//!
//! Builds single-holder distributed locks on top of a [`KeyValueStore`],
//! serializes task execution per `(tenant, resource)` pair, and schedules
//! dependency-ordered multi-step workflows.
//!
//! [`KeyValueStore`]: convoy_store::KeyValueStore

pub mod coordination;
pub mod lock;
pub mod orchestration;
pub mod registry;

pub use coordination::{
    CoordinationManager, CoordinationResult, ExecutionMetadata, LockMetadata, SequenceResult,
};
pub use lock::{
    LockAcquisition, LockError, LockHolder, LockManager, LockOptions, DEFAULT_KEY_PREFIX,
    DEFAULT_LOCK_TTL,
};
pub use orchestration::{
    OrchestrationManager, OrchestrationResult, OrchestrationStep, StepStatus,
};
pub use registry::HandlerRegistry;
