pub mod capabilities;
#[cfg(test)]
pub mod scripted;
pub mod session;

pub use capabilities::{BACKSPACE, Descriptor, ElementCapabilities, UiError};
pub use session::{BrowserConfig, BrowserKind, WebDriverSession, new_session};
