//! Resilient element acquisition.
//!
//! The host application re-renders its DOM several times a second, so a single
//! wait-and-locate can time out or hand back an element that is already stale. Every
//! acquisition therefore goes through a bounded retry and ends with a short settle delay
//! before the caller acts on the handle.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::browser::{Descriptor, ElementCapabilities, UiError};

/// Errors that may clear up on a later attempt.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for UiError {
    fn is_transient(&self) -> bool {
        Self::is_transient(self)
    }
}

/// The last error of a bounded retry and how many attempts were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure<E> {
    pub attempts: u32,
    pub error: E,
}

/// Run `operation` up to `attempts` times.
///
/// Transient failures on every attempt but the last are retried after `backoff`;
/// permanent failures and the final failure are returned as-is. The operation receives
/// the 1-based attempt number.
///
/// # Errors
///
/// Returns the last failure together with the number of attempts made.
pub async fn retry_bounded<T, E, F, Fut>(
    attempts: u32,
    backoff: Duration,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    E: Transient + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < attempts => {
                log::warn!("attempt {attempt}/{attempts} failed: {error}; retrying");
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
                attempt += 1;
            }
            Err(error) => {
                return Err(RetryFailure {
                    attempts: attempt,
                    error,
                });
            }
        }
    }
}

/// Retry and timing parameters for element acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "RetryPolicy::default_attempts")]
    pub attempts: u32,
    #[serde(default = "RetryPolicy::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "RetryPolicy::default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default)]
    pub backoff_ms: u64,
}

impl RetryPolicy {
    const fn default_attempts() -> u32 {
        3
    }

    const fn default_timeout_ms() -> u64 {
        5_000
    }

    const fn default_settle_ms() -> u64 {
        200
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: Self::default_attempts(),
            timeout_ms: Self::default_timeout_ms(),
            settle_ms: Self::default_settle_ms(),
            backoff_ms: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("{descriptor} not found after {attempts} attempt(s)")]
    NotFound {
        descriptor: Descriptor,
        attempts: u32,
        #[source]
        source: UiError,
    },
    #[error("locating {descriptor} failed")]
    Session {
        descriptor: Descriptor,
        #[source]
        source: UiError,
    },
}

impl LocatorError {
    #[must_use]
    pub const fn descriptor(&self) -> &Descriptor {
        match self {
            Self::NotFound { descriptor, .. } | Self::Session { descriptor, .. } => descriptor,
        }
    }
}

/// Acquires actionable handles through a capability set with bounded retries.
pub struct ResilientLocator<'a, C: ElementCapabilities + ?Sized> {
    caps: &'a C,
    policy: RetryPolicy,
}

impl<'a, C: ElementCapabilities + ?Sized> ResilientLocator<'a, C> {
    pub const fn new(caps: &'a C, policy: RetryPolicy) -> Self {
        Self { caps, policy }
    }

    pub const fn capabilities(&self) -> &'a C {
        self.caps
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Acquire with the policy's default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::NotFound`] once every attempt has failed transiently, or
    /// [`LocatorError::Session`] on the first permanent failure.
    pub async fn acquire(&self, descriptor: &Descriptor) -> Result<C::Handle, LocatorError> {
        self.acquire_within(descriptor, self.policy.timeout()).await
    }

    /// Acquire with a per-attempt timeout of `timeout`.
    ///
    /// # Errors
    ///
    /// See [`ResilientLocator::acquire`].
    pub async fn acquire_within(
        &self,
        descriptor: &Descriptor,
        timeout: Duration,
    ) -> Result<C::Handle, LocatorError> {
        log::debug!("Selecting: {descriptor}");
        let handle = retry_bounded(self.policy.attempts, self.policy.backoff(), |_| {
            self.caps.locate(descriptor, timeout)
        })
        .await
        .map_err(|failure| {
            if failure.error.is_transient() {
                LocatorError::NotFound {
                    descriptor: descriptor.clone(),
                    attempts: failure.attempts,
                    source: failure.error,
                }
            } else {
                LocatorError::Session {
                    descriptor: descriptor.clone(),
                    source: failure.error,
                }
            }
        })?;
        tokio::time::sleep(self.policy.settle()).await;
        Ok(handle)
    }
}
