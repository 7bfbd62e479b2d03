use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::prelude::*;

use super::capabilities::{Descriptor, ElementCapabilities, UiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BrowserKind {
    Chrome,
    Edge,
    Firefox,
    Safari,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub incognito: bool,
    pub poll_interval: Duration,
    pub remote_hub: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            incognito: true,
            poll_interval: Duration::from_millis(100),
            remote_hub: None,
        }
    }
}

pub async fn new_session(kind: BrowserKind, cfg: &BrowserConfig) -> WebDriverResult<WebDriverSession> {
    let driver = match kind {
        BrowserKind::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            if cfg.headless {
                caps.set_headless()?;
            }
            if cfg.incognito {
                caps.add_arg("--incognito")?;
            }

            let url = cfg.remote_hub.as_deref().unwrap_or("http://localhost:9515");
            WebDriver::new(url, caps).await?
        }
        BrowserKind::Edge => {
            let mut caps = DesiredCapabilities::edge();
            if cfg.headless {
                caps.set_headless()?;
            }

            let url = cfg
                .remote_hub
                .as_deref()
                .unwrap_or("http://localhost:17556");
            WebDriver::new(url, caps).await?
        }
        BrowserKind::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            if cfg.headless {
                caps.set_headless()?;
            }

            let url = cfg.remote_hub.as_deref().unwrap_or("http://localhost:4444");
            WebDriver::new(url, caps).await?
        }
        BrowserKind::Safari => {
            let caps = DesiredCapabilities::safari();
            let url = cfg.remote_hub.as_deref().unwrap_or("http://localhost:4445");
            WebDriver::new(url, caps).await?
        }
    };

    Ok(WebDriverSession {
        driver,
        poll_interval: cfg.poll_interval,
    })
}

/// A live WebDriver session. Descriptors are interpreted as XPath expressions.
pub struct WebDriverSession {
    driver: WebDriver,
    poll_interval: Duration,
}

impl WebDriverSession {
    #[must_use]
    pub const fn driver(&self) -> &WebDriver {
        &self.driver
    }

    pub async fn navigate(&self, url: &str) -> WebDriverResult<()> {
        self.driver.goto(url).await
    }

    pub async fn close(self) -> WebDriverResult<()> {
        self.driver.quit().await
    }
}

#[async_trait]
impl ElementCapabilities for WebDriverSession {
    type Handle = WebElement;

    async fn locate(
        &self,
        descriptor: &Descriptor,
        timeout: Duration,
    ) -> Result<WebElement, UiError> {
        self.driver
            .query(By::XPath(descriptor.as_str().to_string()))
            .wait(timeout, self.poll_interval)
            .and_clickable()
            .first()
            .await
            .map_err(|err| classify_locate_error(&err.to_string(), descriptor, timeout))
    }

    async fn hover(&self, handle: &WebElement) -> Result<(), UiError> {
        self.driver
            .action_chain()
            .move_to_element_center(handle)
            .perform()
            .await
            .map_err(|err| classify_interaction_error(&err.to_string()))
    }

    async fn click(&self, handle: &WebElement) -> Result<(), UiError> {
        handle
            .click()
            .await
            .map_err(|err| classify_interaction_error(&err.to_string()))
    }

    async fn type_text(&self, handle: &WebElement, text: &str) -> Result<(), UiError> {
        handle
            .send_keys(text.to_string())
            .await
            .map_err(|err| classify_interaction_error(&err.to_string()))
    }

    async fn scroll_into_view(&self, handle: &WebElement) -> Result<(), UiError> {
        handle
            .scroll_into_view()
            .await
            .map_err(|err| classify_interaction_error(&err.to_string()))
    }
}

const SESSION_MARKERS: [&str; 4] = [
    "invalid session id",
    "session not created",
    "no such window",
    "connection refused",
];

fn is_session_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    SESSION_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn classify_locate_error(message: &str, descriptor: &Descriptor, timeout: Duration) -> UiError {
    if is_session_failure(message) {
        return UiError::Session(message.to_string());
    }
    if message.to_lowercase().contains("stale") {
        return UiError::Stale(message.to_string());
    }
    UiError::Timeout {
        descriptor: descriptor.clone(),
        timeout,
    }
}

fn classify_interaction_error(message: &str) -> UiError {
    let lower = message.to_lowercase();
    if is_session_failure(&lower) {
        UiError::Session(message.to_string())
    } else if lower.contains("stale") {
        UiError::Stale(message.to_string())
    } else {
        UiError::NotInteractable(message.to_string())
    }
}
