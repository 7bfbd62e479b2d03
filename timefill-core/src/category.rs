//! Timesheet categories and the ordered category → value map used for both
//! percentage allocations and daily hour distributions.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

use crate::quarter::Quarters;

/// Identifier of a timesheet category such as `admin` or `student`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Construct a category from a string slice, trimming whitespace.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier has no visible characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Inline storage; allocations rarely exceed a handful of categories.
pub type CategoryEntries = SmallVec<[(Category, Quarters); 4]>;

/// Insertion-ordered map from category to an exact quarter value.
///
/// Order is preserved so the entry driver fills rows in the configured order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryMap {
    entries: CategoryEntries,
}

impl CategoryMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `category` to `value`, appending it when not yet present.
    pub fn set(&mut self, category: &Category, value: Quarters) {
        if let Some(slot) = self.entries.iter_mut().find(|(c, _)| c == category) {
            slot.1 = value;
        } else {
            self.entries.push((category.clone(), value));
        }
    }

    /// Add `delta` to the entry at `index`. Out-of-range indices are ignored.
    pub fn add_at(&mut self, index: usize, delta: Quarters) {
        if let Some(slot) = self.entries.get_mut(index) {
            slot.1 += delta;
        }
    }

    #[must_use]
    pub fn get(&self, category: &Category) -> Option<Quarters> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, v)| *v)
    }

    /// Category stored at `index`.
    #[must_use]
    pub fn category_at(&self, index: usize) -> Option<&Category> {
        self.entries.get(index).map(|(c, _)| c)
    }

    #[must_use]
    pub fn total(&self) -> Quarters {
        self.entries.iter().map(|(_, v)| *v).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, Quarters)> {
        self.entries.iter().map(|(c, v)| (c, *v))
    }

    pub fn values(&self) -> impl Iterator<Item = Quarters> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }
}

impl FromIterator<(Category, Quarters)> for CategoryMap {
    fn from_iter<I: IntoIterator<Item = (Category, Quarters)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (category, value) in iter {
            map.set(&category, value);
        }
        map
    }
}

impl Serialize for CategoryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, value) in &self.entries {
            map.serialize_entry(category.as_str(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_trims_input() {
        let category = Category::new("  admin ");
        assert_eq!(category.as_str(), "admin");
        assert!(Category::new("   ").is_empty());
    }

    #[test]
    fn set_replaces_existing_and_keeps_order() {
        let mut map = CategoryMap::new();
        map.set(&"student".into(), Quarters::from_whole(6));
        map.set(&"admin".into(), Quarters::from_whole(4));
        map.set(&"student".into(), Quarters::from_whole(5));
        let order: Vec<&str> = map.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(order, vec!["student", "admin"]);
        assert_eq!(map.get(&"student".into()), Some(Quarters::from_whole(5)));
        assert_eq!(map.total(), Quarters::from_whole(9));
    }

    #[test]
    fn add_at_ignores_out_of_range() {
        let mut map: CategoryMap = [(Category::new("a"), Quarters::from_quarters(3))]
            .into_iter()
            .collect();
        map.add_at(0, Quarters::from_quarters(1));
        map.add_at(5, Quarters::from_quarters(100));
        assert_eq!(map.total(), Quarters::from_whole(1));
    }

    #[test]
    fn serializes_in_insertion_order() {
        let map: CategoryMap = [
            (Category::new("student"), Quarters::from_quarters(24)),
            (Category::new("admin"), Quarters::from_quarters(17)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"student":6.0,"admin":4.25}"#);
    }
}
