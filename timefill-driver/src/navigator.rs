//! Cascading menu traversal.
//!
//! A category's [`MenuPath`] lists the captions to pick, from the first submenu to the
//! terminal entry. Intermediate captions are matched by substring because the host
//! decorates or truncates them; the final caption must match exactly. Each pick is a
//! hover followed by a click, then a fixed pause while the next submenu animates in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use timefill_core::Category;

use crate::browser::{Descriptor, ElementCapabilities, UiError};
use crate::locator::{LocatorError, ResilientLocator};
use crate::settings::render_template;

/// Ordered menu captions leading to one terminal selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuPath(Vec<String>);

impl MenuPath {
    #[must_use]
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Category → menu path lookup table.
pub type MenuPaths = BTreeMap<Category, MenuPath>;

/// Descriptor templates for menu items; `{label}` is replaced by the caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemTemplates {
    #[serde(default = "MenuItemTemplates::default_exact")]
    pub exact: String,
    #[serde(default = "MenuItemTemplates::default_contains")]
    pub contains: String,
}

impl MenuItemTemplates {
    fn default_exact() -> String {
        "(//div[text() = '{label}'])[last()]".to_string()
    }

    fn default_contains() -> String {
        "(//div[contains(text(), '{label}')])[last()]".to_string()
    }

    /// Descriptor for `label`; `terminal` selects exact matching.
    #[must_use]
    pub fn descriptor(&self, label: &str, terminal: bool) -> Descriptor {
        let template = if terminal { &self.exact } else { &self.contains };
        Descriptor::new(render_template(template, &[("label", label)]))
    }
}

impl Default for MenuItemTemplates {
    fn default() -> Self {
        Self {
            exact: Self::default_exact(),
            contains: Self::default_contains(),
        }
    }
}

/// Where the navigator is in a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Closed,
    Open,
    /// Picking the label at this 1-based depth.
    Selecting { level: usize },
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("no menu path configured for category `{0}`")]
    UnknownCategory(Category),
    #[error("could not open the menu for `{category}`")]
    Open {
        category: Category,
        #[source]
        source: LocatorError,
    },
    #[error("menu label `{label}` (level {level}) unresolved for `{category}`")]
    Label {
        category: Category,
        label: String,
        level: usize,
        #[source]
        source: LocatorError,
    },
    #[error("interacting with `{target}` failed")]
    Interaction {
        target: String,
        #[source]
        source: UiError,
    },
}

/// Walks cascading menus using a [`ResilientLocator`].
pub struct MenuNavigator<'a, C: ElementCapabilities + ?Sized> {
    locator: ResilientLocator<'a, C>,
    paths: &'a MenuPaths,
    items: &'a MenuItemTemplates,
    menu_delay: Duration,
    state: MenuState,
}

impl<'a, C: ElementCapabilities + ?Sized> MenuNavigator<'a, C> {
    pub const fn new(
        locator: ResilientLocator<'a, C>,
        paths: &'a MenuPaths,
        items: &'a MenuItemTemplates,
        menu_delay: Duration,
    ) -> Self {
        Self {
            locator,
            paths,
            items,
            menu_delay,
            state: MenuState::Closed,
        }
    }

    #[must_use]
    pub const fn state(&self) -> MenuState {
        self.state
    }

    /// Open the dropdown at `dropdown` and pick the leaf configured for `category`.
    ///
    /// On failure the navigator stays in the state where traversal stopped and no
    /// further labels are attempted.
    ///
    /// # Errors
    ///
    /// Returns a [`NavigationError`] if the category has no path, the dropdown cannot be
    /// opened, or any label cannot be resolved after the locator's retries.
    pub async fn choose(
        &mut self,
        dropdown: &Descriptor,
        category: &Category,
    ) -> Result<(), NavigationError> {
        let path = self
            .paths
            .get(category)
            .ok_or_else(|| NavigationError::UnknownCategory(category.clone()))?;
        log::debug!("Opening the menu for Time Type: {category}");

        self.state = MenuState::Closed;
        let caps = self.locator.capabilities();
        let host = self
            .locator
            .acquire(dropdown)
            .await
            .map_err(|source| NavigationError::Open {
                category: category.clone(),
                source,
            })?;
        caps.scroll_into_view(&host)
            .await
            .map_err(|source| interaction(dropdown.as_str(), source))?;
        caps.click(&host)
            .await
            .map_err(|source| interaction(dropdown.as_str(), source))?;
        self.state = MenuState::Open;

        let depth = path.labels().len();
        for (index, label) in path.labels().iter().enumerate() {
            let level = index + 1;
            self.state = MenuState::Selecting { level };
            log::debug!("Selecting submenu item: {label}");

            let descriptor = self.items.descriptor(label, level == depth);
            let item = self.locator.acquire(&descriptor).await.map_err(|source| {
                NavigationError::Label {
                    category: category.clone(),
                    label: label.clone(),
                    level,
                    source,
                }
            })?;
            caps.hover(&item)
                .await
                .map_err(|source| interaction(label, source))?;
            caps.click(&item)
                .await
                .map_err(|source| interaction(label, source))?;

            tokio::time::sleep(self.menu_delay).await;
        }

        self.state = MenuState::Closed;
        Ok(())
    }
}

fn interaction(target: &str, source: UiError) -> NavigationError {
    NavigationError::Interaction {
        target: target.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::{Call, ScriptedBrowser};
    use crate::locator::RetryPolicy;

    const DROPDOWN: &str = "//div[@id = 'time-type']";

    fn policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            timeout_ms: 10,
            settle_ms: 0,
            backoff_ms: 0,
        }
    }

    fn abc_paths() -> MenuPaths {
        MenuPaths::from([(Category::new("admin"), MenuPath::new(["A", "B", "C"]))])
    }

    fn templates() -> MenuItemTemplates {
        MenuItemTemplates {
            exact: "exact:{label}".to_string(),
            contains: "contains:{label}".to_string(),
        }
    }

    #[test]
    fn walks_every_label_with_hover_then_click() {
        let browser = ScriptedBrowser::new();
        let paths = abc_paths();
        let items = templates();
        let mut navigator = MenuNavigator::new(
            ResilientLocator::new(&browser, policy()),
            &paths,
            &items,
            Duration::ZERO,
        );

        tokio_test::block_on(navigator.choose(&Descriptor::new(DROPDOWN), &"admin".into()))
            .unwrap();
        assert_eq!(navigator.state(), MenuState::Closed);

        let interactions: Vec<Call> = browser
            .calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Locate { .. }))
            .collect();
        assert_eq!(
            interactions,
            vec![
                Call::Scroll(DROPDOWN.into()),
                Call::Click(DROPDOWN.into()),
                Call::Hover("contains:A".into()),
                Call::Click("contains:A".into()),
                Call::Hover("contains:B".into()),
                Call::Click("contains:B".into()),
                Call::Hover("exact:C".into()),
                Call::Click("exact:C".into()),
            ]
        );
    }

    #[test]
    fn unresolved_label_aborts_before_later_labels() {
        let browser = ScriptedBrowser::new().never("contains:B");
        let paths = abc_paths();
        let items = templates();
        let mut navigator = MenuNavigator::new(
            ResilientLocator::new(&browser, policy()),
            &paths,
            &items,
            Duration::ZERO,
        );

        let err = tokio_test::block_on(
            navigator.choose(&Descriptor::new(DROPDOWN), &"admin".into()),
        )
        .unwrap_err();

        match err {
            NavigationError::Label {
                label,
                level,
                source,
                ..
            } => {
                assert_eq!(label, "B");
                assert_eq!(level, 2);
                assert!(matches!(source, LocatorError::NotFound { attempts: 3, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(browser.locate_calls("contains:B").len(), 3);
        assert!(!browser.located("exact:C"));
        assert!(!browser.located("contains:C"));
        assert_eq!(navigator.state(), MenuState::Selecting { level: 2 });
    }

    #[test]
    fn unknown_category_fails_before_touching_the_page() {
        let browser = ScriptedBrowser::new();
        let paths = abc_paths();
        let items = templates();
        let mut navigator = MenuNavigator::new(
            ResilientLocator::new(&browser, policy()),
            &paths,
            &items,
            Duration::ZERO,
        );
        let err = tokio_test::block_on(
            navigator.choose(&Descriptor::new(DROPDOWN), &"guide".into()),
        )
        .unwrap_err();
        assert!(matches!(err, NavigationError::UnknownCategory(_)));
        assert!(browser.calls().is_empty());
    }

    #[test]
    fn missing_dropdown_reports_open_failure() {
        let browser = ScriptedBrowser::new().never(DROPDOWN);
        let paths = abc_paths();
        let items = templates();
        let mut navigator = MenuNavigator::new(
            ResilientLocator::new(&browser, policy()),
            &paths,
            &items,
            Duration::ZERO,
        );
        let err = tokio_test::block_on(
            navigator.choose(&Descriptor::new(DROPDOWN), &"admin".into()),
        )
        .unwrap_err();
        assert!(matches!(err, NavigationError::Open { .. }));
        assert_eq!(navigator.state(), MenuState::Closed);
        assert!(!browser.located("contains:A"));
    }

    #[test]
    fn default_templates_match_exact_and_substring() {
        let items = MenuItemTemplates::default();
        assert_eq!(
            items.descriptor("All", true).as_str(),
            "(//div[text() = 'All'])[last()]"
        );
        assert_eq!(
            items.descriptor("EAB", false).as_str(),
            "(//div[contains(text(), 'EAB')])[last()]"
        );
    }
}
