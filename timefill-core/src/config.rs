//! Allocation and week configuration with validation.
//!
//! Every field carries a serde default so partial JSON documents deserialize into a
//! complete configuration. Validation runs before any generation begins.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;
use crate::quarter::TieBreak;

/// Upper bound of every percentage scale used by the allocator.
pub const PERCENT_SCALE: f64 = 100.0;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("daily hours minimum {min:.2} exceeds maximum {max:.2}")]
    HoursMinExceedsMax { min: f64, max: f64 },
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("split bounds invalid: expected low <= mode <= high, got {low:.2}/{mode:.2}/{high:.2}")]
    SplitBounds { low: f64, mode: f64, high: f64 },
    #[error("{field} must not be empty")]
    EmptyCategory { field: &'static str },
    #[error("category `{0}` is listed more than once")]
    DuplicateCategory(Category),
    #[error("no menu path configured for category `{0}`")]
    MissingMenuPath(Category),
    #[error("menu path for category `{0}` has no labels")]
    EmptyMenuPath(Category),
}

/// Bounds of the triangular split favouring one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangularBounds {
    #[serde(default = "TriangularBounds::default_low")]
    pub low: f64,
    #[serde(default = "TriangularBounds::default_mode")]
    pub mode: f64,
    #[serde(default = "TriangularBounds::default_high")]
    pub high: f64,
}

impl TriangularBounds {
    const fn default_low() -> f64 {
        45.0
    }

    const fn default_mode() -> f64 {
        60.0
    }

    const fn default_high() -> f64 {
        70.0
    }

    /// Bounds that always yield `value`.
    #[must_use]
    pub const fn fixed(value: f64) -> Self {
        Self {
            low: value,
            mode: value,
            high: value,
        }
    }

    /// # Errors
    ///
    /// Returns an error when the bounds are unordered or leave the 0–100 scale.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("split.low", self.low),
            ("split.mode", self.mode),
            ("split.high", self.high),
        ] {
            check_percent(field, value)?;
        }
        if !(self.low <= self.mode && self.mode <= self.high) {
            return Err(ConfigError::SplitBounds {
                low: self.low,
                mode: self.mode,
                high: self.high,
            });
        }
        Ok(())
    }
}

impl Default for TriangularBounds {
    fn default() -> Self {
        Self {
            low: Self::default_low(),
            mode: Self::default_mode(),
            high: Self::default_high(),
        }
    }
}

/// Range the seeded category's floor percentage is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorRange {
    #[serde(default = "FloorRange::default_min")]
    pub min: f64,
    #[serde(default = "FloorRange::default_max")]
    pub max: f64,
}

impl FloorRange {
    const fn default_min() -> f64 {
        2.0
    }

    const fn default_max() -> f64 {
        40.0
    }

    /// # Errors
    ///
    /// Returns an error when the range is inverted or leaves the 0–100 scale.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percent("floor.min", self.min)?;
        check_percent("floor.max", self.max)?;
        if self.min > self.max {
            return Err(ConfigError::RangeViolation {
                field: "floor.min",
                min: 0.0,
                max: self.max,
                value: self.min,
            });
        }
        Ok(())
    }
}

impl Default for FloorRange {
    fn default() -> Self {
        Self {
            min: Self::default_min(),
            max: Self::default_max(),
        }
    }
}

/// Shape of the draw used for non-seeded categories in the seeded policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawShape {
    /// Triangular over `[0, headroom]` peaking at the midpoint.
    Triangular,
    /// Uniform over `[0, headroom]`.
    #[default]
    Uniform,
}

/// Allocation strategy selected by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Two categories split by a triangular draw.
    TwoCategory {
        favored: Category,
        peer: Category,
        #[serde(default)]
        split: TriangularBounds,
    },
    /// One category seeded with a floor, the rest apportioned and corrected to 100.
    Seeded {
        seeded: Category,
        others: Vec<Category>,
        #[serde(default)]
        floor: FloorRange,
        #[serde(default)]
        draw: DrawShape,
        #[serde(default = "PolicyConfig::default_max_correction_rounds")]
        max_correction_rounds: u32,
    },
}

impl PolicyConfig {
    const fn default_max_correction_rounds() -> u32 {
        50
    }

    /// Categories in the order they are reported and entered.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        match self {
            Self::TwoCategory { favored, peer, .. } => vec![favored.clone(), peer.clone()],
            Self::Seeded { seeded, others, .. } => std::iter::once(seeded.clone())
                .chain(others.iter().cloned())
                .collect(),
        }
    }

    /// # Errors
    ///
    /// Returns an error for empty or duplicated categories, invalid bounds, or a zero
    /// correction bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let categories = self.categories();
        for (i, category) in categories.iter().enumerate() {
            if category.is_empty() {
                return Err(ConfigError::EmptyCategory {
                    field: "allocation.policy",
                });
            }
            if categories[..i].contains(category) {
                return Err(ConfigError::DuplicateCategory(category.clone()));
            }
        }
        match self {
            Self::TwoCategory { split, .. } => split.validate(),
            Self::Seeded {
                floor,
                max_correction_rounds,
                ..
            } => {
                floor.validate()?;
                if *max_correction_rounds == 0 {
                    return Err(ConfigError::MinViolation {
                        field: "allocation.policy.max_correction_rounds",
                        min: 1.0,
                        value: 0.0,
                    });
                }
                Ok(())
            }
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::TwoCategory {
            favored: Category::new("student"),
            peer: Category::new("admin"),
            split: TriangularBounds::default(),
        }
    }
}

/// Allocation policy plus the rounding rule applied to every quarter conversion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllocationConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub rounding: TieBreak,
}

impl AllocationConfig {
    /// # Errors
    ///
    /// Returns an error when the policy configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()
    }
}

/// Bounds for the randomly drawn daily totals of one simulated week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekConfig {
    #[serde(default = "WeekConfig::default_min_daily_hours")]
    pub min_daily_hours: f64,
    #[serde(default = "WeekConfig::default_max_daily_hours")]
    pub max_daily_hours: f64,
    #[serde(default = "WeekConfig::default_days_in_week")]
    pub days_in_week: u32,
}

impl WeekConfig {
    const fn default_min_daily_hours() -> f64 {
        8.0
    }

    const fn default_max_daily_hours() -> f64 {
        13.0
    }

    const fn default_days_in_week() -> u32 {
        5
    }

    /// # Errors
    ///
    /// Returns an error for negative or non-finite hours, or when `max < min`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("week.min_daily_hours", self.min_daily_hours),
            ("week.max_daily_hours", self.max_daily_hours),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        if self.min_daily_hours > self.max_daily_hours {
            return Err(ConfigError::HoursMinExceedsMax {
                min: self.min_daily_hours,
                max: self.max_daily_hours,
            });
        }
        Ok(())
    }
}

impl Default for WeekConfig {
    fn default() -> Self {
        Self {
            min_daily_hours: Self::default_min_daily_hours(),
            max_daily_hours: Self::default_max_daily_hours(),
            days_in_week: Self::default_days_in_week(),
        }
    }
}

fn check_percent(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=PERCENT_SCALE).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min: 0.0,
            max: PERCENT_SCALE,
            value,
        });
    }
    Ok(())
}
