//! Timefill browser driver
//!
//! Resilient element acquisition, cascading menu navigation and weekly time entry on top
//! of a WebDriver session, plus the reports and settings the `timefill` binary uses.

pub mod artifacts;
pub mod browser;
pub mod credentials;
pub mod entry;
pub mod locator;
pub mod navigator;
pub mod reports;
pub mod settings;

pub use browser::{
    BrowserConfig, BrowserKind, Descriptor, ElementCapabilities, UiError, WebDriverSession,
    new_session,
};
pub use credentials::{CredentialError, get_password};
pub use entry::{EntryDriver, EntryError, EntryReport};
pub use locator::{LocatorError, ResilientLocator, RetryPolicy, retry_bounded};
pub use navigator::{MenuNavigator, MenuPath, MenuState, NavigationError};
pub use reports::{PlanReport, ReportFormat, write_report};
pub use settings::{SettingsError, TimefillConfig};
