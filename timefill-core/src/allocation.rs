//! Allocation policies turning a daily total into per-category hours.
//!
//! Two strategies are supported:
//!
//! - [`TwoCategoryPolicy`] draws a triangular split favouring one category and gives the
//!   peer the complement.
//! - [`SeededPolicy`] seeds one category with a floor, apportions the remaining
//!   headroom in random order, then runs a correction loop until the percentages sum to
//!   exactly 100.
//!
//! Percentages in the seeded policy are exact quarter values, so the sum-to-100 check is
//! an integer comparison. Hours are rounded per category, so a day's total may differ
//! from its target by up to `categories * 0.125`.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Triangular};
use serde::Serialize;
use thiserror::Error;

use crate::category::{Category, CategoryMap};
use crate::config::{
    AllocationConfig, ConfigError, DrawShape, FloorRange, PERCENT_SCALE, PolicyConfig,
    TriangularBounds,
};
use crate::quarter::{Quarters, TieBreak, quarter_round};

/// Errors raised while generating an allocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("percentages did not converge to 100 after {rounds} correction rounds (sum {total})")]
    NotConverged { rounds: u32, total: Quarters },
    #[error("category `{category}` received a negative share ({value})")]
    NegativeShare { category: Category, value: Quarters },
}

/// Category → percentage points, summing to exactly 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PercentageAllocation {
    pub shares: CategoryMap,
    /// Iterations the correction loop needed to close the gap.
    pub correction_rounds: u32,
}

/// Category → hours for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyDistribution {
    pub target_hours: Quarters,
    pub hours: CategoryMap,
}

impl DailyDistribution {
    /// Sum of the rounded per-category hours.
    #[must_use]
    pub fn total_hours(&self) -> Quarters {
        self.hours.total()
    }
}

/// Hours for a share of the day, rounded in hour units.
///
/// The computation goes through minutes so the rounding resolution is a quarter hour
/// rather than a quarter percent.
#[must_use]
pub fn hours_for_share(daily_hours: Quarters, percent: f64, tie: TieBreak) -> Quarters {
    let minutes = daily_hours.as_f64() * 60.0;
    quarter_round(minutes * (percent / PERCENT_SCALE) / 60.0, tie)
}

/// Split draw that never samples a zero-width interval.
#[derive(Debug, Clone)]
enum SplitDraw {
    Fixed(f64),
    Triangular(Triangular<f64>),
}

impl SplitDraw {
    fn from_bounds(bounds: &TriangularBounds) -> Result<Self, ConfigError> {
        bounds.validate()?;
        if bounds.low >= bounds.high {
            return Ok(Self::Fixed(bounds.low));
        }
        Triangular::new(bounds.low, bounds.high, bounds.mode)
            .map(Self::Triangular)
            .map_err(|_| ConfigError::SplitBounds {
                low: bounds.low,
                mode: bounds.mode,
                high: bounds.high,
            })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Fixed(value) => *value,
            Self::Triangular(dist) => dist.sample(rng),
        }
    }
}

/// Favoured/peer split drawn from a triangular distribution.
#[derive(Debug, Clone)]
pub struct TwoCategoryPolicy {
    favored: Category,
    peer: Category,
    split: SplitDraw,
    rounding: TieBreak,
}

impl TwoCategoryPolicy {
    /// # Errors
    ///
    /// Returns an error when the split bounds are invalid.
    pub fn new(
        favored: Category,
        peer: Category,
        bounds: &TriangularBounds,
        rounding: TieBreak,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            favored,
            peer,
            split: SplitDraw::from_bounds(bounds)?,
            rounding,
        })
    }

    /// Percentage assigned to the favoured category.
    pub fn draw_split<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.split.sample(rng)
    }

    /// Distribute `daily_hours` given a favoured-category percentage.
    #[must_use]
    pub fn distribute(&self, daily_hours: Quarters, split: f64) -> DailyDistribution {
        let mut hours = CategoryMap::new();
        hours.set(
            &self.favored,
            hours_for_share(daily_hours, split, self.rounding),
        );
        hours.set(
            &self.peer,
            hours_for_share(daily_hours, PERCENT_SCALE - split, self.rounding),
        );
        DailyDistribution {
            target_hours: daily_hours,
            hours,
        }
    }
}

/// One seeded floor category plus randomly apportioned peers, corrected to 100.
#[derive(Debug, Clone)]
pub struct SeededPolicy {
    seeded: Category,
    others: Vec<Category>,
    floor: FloorRange,
    draw: DrawShape,
    max_correction_rounds: u32,
    rounding: TieBreak,
}

impl SeededPolicy {
    /// # Errors
    ///
    /// Returns an error when the floor range or correction bound is invalid.
    pub fn new(
        seeded: Category,
        others: Vec<Category>,
        floor: FloorRange,
        draw: DrawShape,
        max_correction_rounds: u32,
        rounding: TieBreak,
    ) -> Result<Self, ConfigError> {
        PolicyConfig::Seeded {
            seeded: seeded.clone(),
            others: others.clone(),
            floor,
            draw,
            max_correction_rounds,
        }
        .validate()?;
        Ok(Self {
            seeded,
            others,
            floor,
            draw,
            max_correction_rounds,
            rounding,
        })
    }

    /// Generate a percentage allocation summing to exactly 100.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::NotConverged`] if the correction loop exhausts its bound
    /// and [`AllocationError::NegativeShare`] if any share ends below zero.
    pub fn percentages<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<PercentageAllocation, AllocationError> {
        let hundred = percent_total();
        let mut shares = CategoryMap::new();

        let floor = quarter_round(
            draw_between(rng, self.floor.min, self.floor.max, DrawShape::Uniform),
            self.rounding,
        )
        .clamp(Quarters::ZERO, hundred);
        shares.set(&self.seeded, floor);
        for category in &self.others {
            shares.set(category, Quarters::ZERO);
        }

        let mut order = self.others.clone();
        order.shuffle(rng);
        for category in &order {
            let headroom = hundred - shares.total();
            let value = if headroom.is_zero() {
                Quarters::ZERO
            } else {
                quarter_round(
                    draw_between(rng, 0.0, headroom.as_f64(), self.draw),
                    self.rounding,
                )
                .clamp(Quarters::ZERO, headroom)
            };
            shares.set(category, value);
        }

        let correction_rounds = self.correct(&mut shares, rng)?;

        if let Some((category, value)) = shares.iter().find(|(_, v)| v.is_negative()) {
            return Err(AllocationError::NegativeShare {
                category: category.clone(),
                value,
            });
        }

        log::debug!(
            "percentage allocation {:?} converged after {correction_rounds} rounds",
            shares
                .iter()
                .map(|(c, v)| format!("{c}={v}"))
                .collect::<Vec<_>>()
        );

        Ok(PercentageAllocation {
            shares,
            correction_rounds,
        })
    }

    /// Close the gap to 100 by nudging random categories.
    ///
    /// The gap is recomputed from the updated sum every round and never grows. The last
    /// permitted round assigns the exact residual instead of drawing.
    fn correct<R: Rng + ?Sized>(
        &self,
        shares: &mut CategoryMap,
        rng: &mut R,
    ) -> Result<u32, AllocationError> {
        let hundred = percent_total();
        let mut rounds = 0;
        loop {
            let total = shares.total();
            let gap = hundred - total;
            if gap.is_zero() {
                return Ok(rounds);
            }
            if gap.is_negative() || rounds >= self.max_correction_rounds || shares.is_empty() {
                return Err(AllocationError::NotConverged { rounds, total });
            }
            rounds += 1;

            let index = rng.gen_range(0..shares.len());
            let adjustment = if rounds == self.max_correction_rounds {
                gap
            } else {
                quarter_round(rng.gen_range(0.0..=gap.as_f64()), self.rounding)
                    .clamp(Quarters::ZERO, gap)
            };
            shares.add_at(index, adjustment);
        }
    }

    /// Percentages converted to hours for `daily_hours`.
    #[must_use]
    pub fn distribute(
        &self,
        daily_hours: Quarters,
        allocation: &PercentageAllocation,
    ) -> DailyDistribution {
        let hours = allocation
            .shares
            .iter()
            .map(|(category, percent)| {
                (
                    category.clone(),
                    hours_for_share(daily_hours, percent.as_f64(), self.rounding),
                )
            })
            .collect();
        DailyDistribution {
            target_hours: daily_hours,
            hours,
        }
    }
}

/// Strategy chosen from [`PolicyConfig`].
#[derive(Debug, Clone)]
pub enum AllocationPolicy {
    TwoCategory(TwoCategoryPolicy),
    Seeded(SeededPolicy),
}

impl AllocationPolicy {
    /// Build the configured strategy.
    ///
    /// # Errors
    ///
    /// Returns an error when the allocation configuration is invalid.
    pub fn from_config(config: &AllocationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        match &config.policy {
            PolicyConfig::TwoCategory {
                favored,
                peer,
                split,
            } => TwoCategoryPolicy::new(favored.clone(), peer.clone(), split, config.rounding)
                .map(Self::TwoCategory),
            PolicyConfig::Seeded {
                seeded,
                others,
                floor,
                draw,
                max_correction_rounds,
            } => SeededPolicy::new(
                seeded.clone(),
                others.clone(),
                *floor,
                *draw,
                *max_correction_rounds,
                config.rounding,
            )
            .map(Self::Seeded),
        }
    }

    /// Generate one day's distribution for `daily_hours`.
    ///
    /// # Errors
    ///
    /// Returns an error when the seeded policy's correction loop fails.
    pub fn daily_distribution<R: Rng + ?Sized>(
        &self,
        daily_hours: Quarters,
        rng: &mut R,
    ) -> Result<DailyDistribution, AllocationError> {
        log::info!("Generating {daily_hours} hours worth of data");
        let distribution = match self {
            Self::TwoCategory(policy) => {
                let split = policy.draw_split(rng);
                policy.distribute(daily_hours, split)
            }
            Self::Seeded(policy) => {
                let allocation = policy.percentages(rng)?;
                policy.distribute(daily_hours, &allocation)
            }
        };
        log::debug!(
            "Created {:?} with a total hour count of {}",
            distribution
                .hours
                .iter()
                .map(|(c, v)| format!("{c}={v}"))
                .collect::<Vec<_>>(),
            distribution.total_hours()
        );
        Ok(distribution)
    }
}

fn percent_total() -> Quarters {
    Quarters::from_whole(100)
}

/// Draw from `[low, high]`, returning `low` for an empty or inverted interval.
fn draw_between<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64, shape: DrawShape) -> f64 {
    if high <= low {
        return low;
    }
    match shape {
        DrawShape::Uniform => rng.gen_range(low..=high),
        DrawShape::Triangular => Triangular::new(low, high, low + (high - low) / 2.0)
            .map_or(low, |dist| dist.sample(rng)),
    }
}
