//! Element interaction capabilities the locator and navigator depend on.
//!
//! Nothing above this module knows how a [`Descriptor`] is interpreted; the WebDriver
//! session reads it as an XPath expression, test doubles as a plain key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// WebDriver key code for Backspace.
pub const BACKSPACE: char = '\u{e003}';

/// Opaque element selection expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(String);

impl Descriptor {
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failures reported by an element interaction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UiError {
    #[error("timed out after {timeout:?} waiting for {descriptor}")]
    Timeout {
        descriptor: Descriptor,
        timeout: Duration,
    },
    #[error("element went stale: {0}")]
    Stale(String),
    #[error("element not interactable: {0}")]
    NotInteractable(String),
    #[error("browser session error: {0}")]
    Session(String),
}

impl UiError {
    /// Whether retrying the same operation may succeed once the page settles.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::Session(_))
    }
}

/// Element-level operations of a browser session.
#[async_trait]
pub trait ElementCapabilities: Send + Sync {
    type Handle: Send + Sync;

    /// Wait up to `timeout` for the described element to become actionable.
    async fn locate(&self, descriptor: &Descriptor, timeout: Duration)
    -> Result<Self::Handle, UiError>;

    async fn hover(&self, handle: &Self::Handle) -> Result<(), UiError>;

    async fn click(&self, handle: &Self::Handle) -> Result<(), UiError>;

    async fn type_text(&self, handle: &Self::Handle, text: &str) -> Result<(), UiError>;

    async fn scroll_into_view(&self, handle: &Self::Handle) -> Result<(), UiError>;
}
