// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic retry-with-backoff wrapper for fallible operations
//!
//! Wraps any caller-supplied async operation with bounded retries,
//! exponential backoff, retryable-vs-fatal classification, and an optional
//! escalation hook. This is the one component that returns the final error
//! to the caller once the retry budget is exhausted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff: `base * multiplier^(attempt-1)`, capped at `max_delay`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    #[serde(with = "humantime_serde")]
    pub base: Duration,
    pub multiplier: f64,
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl BackoffConfig {
    /// No delay between attempts; used by tests and tight inner loops
    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before the retry following the given attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let factor = self.multiplier.max(0.0).powi(attempt as i32 - 1);
        let secs = (self.base.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs.max(0.0))
    }
}

type Classifier<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;
type KindFn<E> = Box<dyn Fn(&E) -> String + Send + Sync>;
type RetryHook<E> = Box<dyn Fn(u32, &E) + Send + Sync>;
type EscalationHook = Box<dyn Fn(&str, u32) + Send + Sync>;

/// Retry policy around a fallible async operation
///
/// `max_retries` bounds retries, not invocations: the operation runs at most
/// `1 + max_retries` times.
pub struct RetryPolicy<E> {
    max_retries: u32,
    backoff: BackoffConfig,
    is_retryable: Classifier<E>,
    kind_of: KindFn<E>,
    on_retry: Option<RetryHook<E>>,
    escalate_after: Option<u32>,
    on_escalate: Option<EscalationHook>,
}

impl<E: std::fmt::Display> RetryPolicy<E> {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffConfig::default(),
            is_retryable: Box::new(|_| true),
            kind_of: Box::new(|_| "error".to_string()),
            on_retry: None,
            escalate_after: None,
            on_escalate: None,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Classify which errors are worth retrying; others surface immediately
    pub fn with_classifier(mut self, f: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.is_retryable = Box::new(f);
        self
    }

    /// Map errors to a kind label used for per-kind escalation counting
    pub fn with_kind(mut self, f: impl Fn(&E) -> String + Send + Sync + 'static) -> Self {
        self.kind_of = Box::new(f);
        self
    }

    /// Observe each retry (attempt number, triggering error)
    pub fn with_on_retry(mut self, f: impl Fn(u32, &E) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Box::new(f));
        self
    }

    /// Fire a hook once a single error kind has failed `threshold` attempts
    ///
    /// Escalation does not stop the retry loop; it lets callers page or
    /// alert while retries continue.
    pub fn with_escalation(
        mut self,
        threshold: u32,
        f: impl Fn(&str, u32) + Send + Sync + 'static,
    ) -> Self {
        self.escalate_after = Some(threshold);
        self.on_escalate = Some(Box::new(f));
        self
    }

    /// Run the operation under this policy, returning the last error once
    /// retries are exhausted or a non-retryable error is seen
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut kind_counts: HashMap<String, u32> = HashMap::new();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let kind = (self.kind_of)(&err);
                    let count = kind_counts.entry(kind.clone()).or_insert(0);
                    *count += 1;

                    if let (Some(threshold), Some(hook)) =
                        (self.escalate_after, self.on_escalate.as_ref())
                    {
                        if *count == threshold {
                            tracing::warn!(kind = %kind, attempts = *count, "retry escalation threshold reached");
                            hook(&kind, *count);
                        }
                    }

                    if attempt > self.max_retries {
                        tracing::debug!(attempt, error = %err, "retry budget exhausted");
                        return Err(err);
                    }
                    if !(self.is_retryable)(&err) {
                        tracing::debug!(attempt, error = %err, "error is not retryable");
                        return Err(err);
                    }

                    if let Some(hook) = self.on_retry.as_ref() {
                        hook(attempt, &err);
                    }

                    let delay = self.backoff.delay_for(attempt);
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
