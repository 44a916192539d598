// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed single-holder locks keyed by tenant and resource
//!
//! A lock is held iff a live entry exists for its key in the backing store.
//! Acquisition is a conditional create; there is no heartbeat or renewal
//! protocol, so TTL expiry is the sole self-healing mechanism for crashed
//! holders. Long critical sections must set a larger TTL up front.

use chrono::{DateTime, Utc};
use convoy_core::metadata::MetaMap;
use convoy_store::{KeyValueStore, SetOptions, StoreError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Default prefix for lock keys; part of the wire format
pub const DEFAULT_KEY_PREFIX: &str = "run";

/// Default lock TTL, bounding the blast radius of a crashed holder
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(900);

/// Per-acquisition lock options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockOptions {
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    #[serde(default)]
    pub metadata: MetaMap,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_LOCK_TTL,
            metadata: MetaMap::new(),
        }
    }
}

impl LockOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_metadata(mut self, metadata: MetaMap) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The value stored under a lock key while held
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockHolder {
    pub holder_id: String,
    pub acquired_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: MetaMap,
}

/// Outcome of a single acquisition attempt
///
/// Ephemeral: valid only for the duration of the critical section it
/// guards.
#[derive(Debug, Clone)]
pub struct LockAcquisition {
    pub key: String,
    pub acquired: bool,
    /// Current holder's stored value when acquisition was denied
    pub holder: Option<serde_json::Value>,
}

/// Errors from lock-guarded execution
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock contended: {key}")]
    Contended { key: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Manages single-holder locks on top of a key/value store
///
/// The manager never blocks or retries internally: a failed acquisition
/// returns immediately with the current holder so the caller can decide to
/// wait, fail, or report contention.
#[derive(Clone)]
pub struct LockManager<S> {
    store: S,
    key_prefix: String,
}

impl<S: KeyValueStore> LockManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(store: S, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Lock key for a tenant/resource pair; format is bit-exact for
    /// interop: `"{prefix}:{tenant}:{resource}"`
    pub fn key(&self, tenant_id: &str, resource_id: &str) -> String {
        format!("{}:{}:{}", self.key_prefix, tenant_id, resource_id)
    }

    /// Attempt a conditional create of the lock key
    pub async fn acquire(
        &self,
        tenant_id: &str,
        resource_id: &str,
        options: &LockOptions,
    ) -> Result<LockAcquisition, StoreError> {
        let key = self.key(tenant_id, resource_id);
        let holder = LockHolder {
            holder_id: Uuid::new_v4().to_string(),
            acquired_at: Utc::now(),
            metadata: options.metadata.clone(),
        };
        let value = serde_json::to_value(&holder)?;

        let stored = self
            .store
            .set(
                &key,
                value,
                SetOptions::create_if_absent().with_ttl(options.ttl),
            )
            .await?;

        if stored {
            tracing::debug!(key = %key, holder = %holder.holder_id, ttl_secs = options.ttl.as_secs(), "lock acquired");
            Ok(LockAcquisition {
                key,
                acquired: true,
                holder: None,
            })
        } else {
            let current = self.store.get(&key).await?;
            tracing::debug!(key = %key, "lock denied");
            Ok(LockAcquisition {
                key,
                acquired: false,
                holder: current,
            })
        }
    }

    /// Unconditionally delete the lock key; idempotent
    pub async fn release(
        &self,
        tenant_id: &str,
        resource_id: &str,
    ) -> Result<bool, StoreError> {
        let key = self.key(tenant_id, resource_id);
        let removed = self.store.delete(&key).await?;
        tracing::debug!(key = %key, removed, "lock released");
        Ok(removed)
    }

    /// Read-only probe of the current holder; expired entries read as
    /// absent
    pub async fn check(
        &self,
        tenant_id: &str,
        resource_id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let key = self.key(tenant_id, resource_id);
        self.store.get(&key).await
    }

    /// Run `f` under the lock, releasing on every exit path
    ///
    /// Fails fast with [`LockError::Contended`] if acquisition fails. A
    /// release failure after `f` completes is logged and swallowed so it
    /// never masks the closure's own outcome.
    pub async fn with_lock<T, F, Fut>(
        &self,
        tenant_id: &str,
        resource_id: &str,
        options: &LockOptions,
        f: F,
    ) -> Result<T, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let acquisition = self.acquire(tenant_id, resource_id, options).await?;
        if !acquisition.acquired {
            return Err(LockError::Contended {
                key: acquisition.key,
            });
        }

        let output = f().await;

        if let Err(err) = self.release(tenant_id, resource_id).await {
            tracing::warn!(key = %acquisition.key, error = %err, "lock release failed during cleanup");
        }

        Ok(output)
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
