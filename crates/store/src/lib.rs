// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! convoy-store: Key/value store abstraction with TTL and conditional sets
//!
//! The store is the single cross-process synchronization primitive the
//! coordination core relies on: `SetCondition::CreateIfAbsent` must be
//! atomic at the store layer (SETNX-equivalent semantics). An in-memory
//! implementation is provided as the reference and test double.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Write condition for a conditional set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetCondition {
    /// Succeed only if no live (non-expired) value exists for the key
    CreateIfAbsent,
    /// Succeed only if a live value already exists for the key
    UpdateIfPresent,
}

/// Options for a set operation
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    pub ttl: Option<Duration>,
    pub condition: Option<SetCondition>,
}

impl SetOptions {
    pub fn create_if_absent() -> Self {
        Self {
            ttl: None,
            condition: Some(SetCondition::CreateIfAbsent),
        }
    }

    pub fn update_if_present() -> Self {
        Self {
            ttl: None,
            condition: Some(SetCondition::UpdateIfPresent),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Minimal key/value abstraction consumed by the lock manager
///
/// Expired entries must be treated as absent by every operation.
#[async_trait]
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Read the live value for a key, if any
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Write a value, honoring the condition; returns whether the write
    /// took effect
    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        options: SetOptions,
    ) -> Result<bool, StoreError>;

    /// Delete a key; returns whether a live entry was removed
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}
