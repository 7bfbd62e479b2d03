//! Week entry: drives the host application's time entry dialog from a weekly plan.

use serde::Serialize;
use thiserror::Error;
use timefill_core::{AllocationError, DailyDistribution, Quarters};

use crate::browser::{BACKSPACE, Descriptor, ElementCapabilities, UiError};
use crate::locator::{LocatorError, ResilientLocator};
use crate::navigator::{MenuNavigator, NavigationError};
use crate::settings::TimefillConfig;

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("{step} could not be located")]
    Locate {
        step: &'static str,
        #[source]
        source: LocatorError,
    },
    #[error("choosing the time type failed on day {day}")]
    Navigation {
        day: usize,
        #[source]
        source: NavigationError,
    },
    #[error("{step} failed")]
    Interaction {
        step: &'static str,
        #[source]
        source: UiError,
    },
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// What was entered during one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub days: Vec<DailyDistribution>,
}

impl EntryReport {
    #[must_use]
    pub fn total_hours(&self) -> Quarters {
        self.days.iter().map(DailyDistribution::total_hours).sum()
    }

    #[must_use]
    pub fn rows_entered(&self) -> usize {
        self.days.iter().map(|day| day.hours.len()).sum()
    }
}

pub struct EntryDriver<'a, C: ElementCapabilities + ?Sized> {
    caps: &'a C,
    locator: ResilientLocator<'a, C>,
    navigator: MenuNavigator<'a, C>,
    config: &'a TimefillConfig,
}

impl<'a, C: ElementCapabilities + ?Sized> EntryDriver<'a, C> {
    pub fn new(caps: &'a C, config: &'a TimefillConfig) -> Self {
        let navigator = MenuNavigator::new(
            ResilientLocator::new(caps, config.locator),
            &config.navigation.menu_paths,
            &config.navigation.items,
            config.navigation.menu_delay(),
        );
        Self {
            caps,
            locator: ResilientLocator::new(caps, config.locator),
            navigator,
            config,
        }
    }

    /// From the post-login page, open this week's time entry dialog.
    ///
    /// The SSO interstitial login button only appears sometimes; its absence is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error when any required step cannot be located or clicked, or the
    /// session is lost while probing for the login button.
    pub async fn open_timesheet(&self) -> Result<(), EntryError> {
        let selectors = &self.config.selectors;
        match self
            .locator
            .acquire(&Descriptor::new(&selectors.login_button))
            .await
        {
            Ok(button) => self.click(&button, "login button").await?,
            Err(LocatorError::NotFound { .. }) => {
                log::debug!("No interstitial login page shown");
            }
            Err(source) => {
                return Err(EntryError::Locate {
                    step: "login button",
                    source,
                });
            }
        }

        log::info!("Clicking on the \"Time\" section/icon");
        self.acquire_and_click(&selectors.time_section, "Time section")
            .await?;

        log::info!("Clicking on the \"This Week\"");
        self.acquire_and_click(&selectors.this_week, "This Week")
            .await?;

        log::info!("Clicking on \"Enter Time\"");
        let button = self
            .locator
            .acquire_within(
                &Descriptor::new(&selectors.enter_time_button),
                self.config.entry.enter_time_timeout(),
            )
            .await
            .map_err(|source| EntryError::Locate {
                step: "Enter Time button",
                source,
            })?;
        self.click(&button, "Enter Time button").await?;
        self.acquire_and_click(&selectors.enter_time_dialog, "Enter Time dialog")
            .await
    }

    /// Fill every category row of the 1-based `day` tab.
    ///
    /// # Errors
    ///
    /// Returns an error when the tab, a row's controls, or its menu path cannot be
    /// resolved.
    pub async fn enter_day(
        &mut self,
        day: usize,
        distribution: &DailyDistribution,
    ) -> Result<(), EntryError> {
        let config = self.config;
        let selectors = &config.selectors;
        log::info!("Selecting the date");
        let tab = self
            .locator
            .acquire(&selectors.day_tab(day))
            .await
            .map_err(|source| EntryError::Locate {
                step: "day tab",
                source,
            })?;
        self.click(&tab, "day tab").await?;

        for (index, (category, hours)) in distribution.hours.iter().enumerate() {
            let row = selectors.row(day, index + 1);
            self.navigator
                .choose(&selectors.type_dropdown(&row), category)
                .await
                .map_err(|source| EntryError::Navigation { day, source })?;

            log::debug!("Adding hours");
            let input = self
                .locator
                .acquire(&selectors.quantity_input(&row))
                .await
                .map_err(|source| EntryError::Locate {
                    step: "quantity input",
                    source,
                })?;
            let clear: String =
                std::iter::repeat_n(BACKSPACE, config.entry.clear_keystrokes).collect();
            self.type_text(&input, &clear).await?;
            self.type_text(&input, &hours.to_string()).await?;
        }
        Ok(())
    }

    /// Confirm the dialog and wait for the host to persist it.
    ///
    /// # Errors
    ///
    /// Returns an error when the OK button cannot be located or clicked.
    pub async fn save(&self) -> Result<(), EntryError> {
        log::info!("Saving all the data");
        self.acquire_and_click(&self.config.selectors.save_button, "OK button")
            .await?;
        tokio::time::sleep(self.config.entry.save_delay()).await;
        Ok(())
    }

    /// Open the dialog, enter each planned day in order, then save.
    ///
    /// Days are pulled from `days` one at a time, so a lazy plan is generated only as far
    /// as entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first allocation or UI failure; nothing is saved in that case.
    pub async fn submit_week<I>(&mut self, days: I) -> Result<EntryReport, EntryError>
    where
        I: IntoIterator<Item = Result<DailyDistribution, AllocationError>>,
    {
        self.open_timesheet().await?;
        let mut entered = Vec::new();
        for (index, distribution) in days.into_iter().enumerate() {
            let distribution = distribution?;
            self.enter_day(index + 1, &distribution).await?;
            entered.push(distribution);
        }
        self.save().await?;
        Ok(EntryReport { days: entered })
    }

    async fn acquire_and_click(&self, selector: &str, step: &'static str) -> Result<(), EntryError> {
        let handle = self
            .locator
            .acquire(&Descriptor::new(selector))
            .await
            .map_err(|source| EntryError::Locate { step, source })?;
        self.click(&handle, step).await
    }

    async fn click(&self, handle: &C::Handle, step: &'static str) -> Result<(), EntryError> {
        self.caps
            .click(handle)
            .await
            .map_err(|source| EntryError::Interaction { step, source })
    }

    async fn type_text(&self, handle: &C::Handle, text: &str) -> Result<(), EntryError> {
        self.caps
            .type_text(handle, text)
            .await
            .map_err(|source| EntryError::Interaction {
                step: "typing hours",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::{Call, ScriptedBrowser};
    use timefill_core::{Category, CategoryMap};

    fn fast_config() -> TimefillConfig {
        let mut config = TimefillConfig::default();
        config.locator.settle_ms = 0;
        config.locator.timeout_ms = 10;
        config.navigation.menu_delay_ms = 0;
        config.entry.save_delay_ms = 0;
        config
    }

    fn day(student: i64, admin: i64) -> DailyDistribution {
        let hours: CategoryMap = [
            (Category::new("student"), Quarters::from_quarters(student)),
            (Category::new("admin"), Quarters::from_quarters(admin)),
        ]
        .into_iter()
        .collect();
        DailyDistribution {
            target_hours: hours.total(),
            hours,
        }
    }

    fn typed(browser: &ScriptedBrowser) -> Vec<(String, String)> {
        browser
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Type(target, text) => Some((target, text)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn submits_each_day_and_saves() {
        let config = fast_config();
        let browser = ScriptedBrowser::new().never(&config.selectors.login_button);
        let mut driver = EntryDriver::new(&browser, &config);
        let plan = vec![Ok(day(24, 16)), Ok(day(29, 13))];

        let report = tokio_test::block_on(driver.submit_week(plan)).unwrap();

        assert_eq!(report.days.len(), 2);
        assert_eq!(report.rows_entered(), 4);
        assert_eq!(report.total_hours(), Quarters::from_quarters(82));

        let clear: String = std::iter::repeat_n(BACKSPACE, 10).collect();
        let entries = typed(&browser);
        assert_eq!(entries.len(), 8);
        let first_input = config
            .selectors
            .quantity_input(&config.selectors.row(1, 1));
        assert_eq!(entries[0], (first_input.as_str().to_string(), clear.clone()));
        assert_eq!(entries[1], (first_input.as_str().to_string(), "6.0".to_string()));
        let texts: Vec<&str> = entries
            .iter()
            .filter(|(_, text)| *text != clear)
            .map(|(_, text)| text.as_str())
            .collect();
        assert_eq!(texts, vec!["6.0", "4.0", "7.25", "3.25"]);

        let last_click = browser
            .calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                Call::Click(target) => Some(target),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_click, config.selectors.save_button);
    }

    #[test]
    fn enter_time_uses_long_timeout() {
        let config = fast_config();
        let browser = ScriptedBrowser::new();
        let driver = EntryDriver::new(&browser, &config);
        tokio_test::block_on(driver.open_timesheet()).unwrap();
        assert_eq!(
            browser.locate_calls(&config.selectors.enter_time_button),
            vec![config.entry.enter_time_timeout()]
        );
        assert!(browser
            .calls()
            .contains(&Call::Click(config.selectors.login_button.clone())));
    }

    #[test]
    fn lost_session_at_login_is_fatal() {
        let config = fast_config();
        let browser = ScriptedBrowser::new().session_lost(&config.selectors.login_button);
        let driver = EntryDriver::new(&browser, &config);
        let err = tokio_test::block_on(driver.open_timesheet()).unwrap_err();
        assert!(matches!(
            err,
            EntryError::Locate {
                step: "login button",
                source: LocatorError::Session { .. }
            }
        ));
        assert!(!browser.located(&config.selectors.time_section));
    }

    #[test]
    fn unresolved_menu_aborts_the_day_without_saving() {
        let config = fast_config();
        let leaf = config
            .navigation
            .items
            .descriptor("Education Advisory Board > EAB > Student Platform", true);
        let browser = ScriptedBrowser::new().never(leaf.as_str());
        let mut driver = EntryDriver::new(&browser, &config);

        let err = tokio_test::block_on(driver.submit_week(vec![Ok(day(24, 16))])).unwrap_err();

        assert!(matches!(err, EntryError::Navigation { day: 1, .. }));
        assert!(typed(&browser).is_empty());
        assert!(!browser.located(&config.selectors.save_button));
    }

    #[test]
    fn allocation_failure_stops_before_saving() {
        let config = fast_config();
        let browser = ScriptedBrowser::new();
        let mut driver = EntryDriver::new(&browser, &config);
        let plan = vec![
            Ok(day(24, 16)),
            Err(AllocationError::NotConverged {
                rounds: 50,
                total: Quarters::from_whole(99),
            }),
        ];
        let err = tokio_test::block_on(driver.submit_week(plan)).unwrap_err();
        assert!(matches!(err, EntryError::Allocation(_)));
        assert!(!browser.located(&config.selectors.save_button));
    }
}
