//! Weekly planner yielding one daily distribution per simulated work day.

use rand::Rng;

use crate::allocation::{AllocationError, AllocationPolicy, DailyDistribution};
use crate::config::{AllocationConfig, ConfigError, WeekConfig};
use crate::quarter::{Quarters, TieBreak, quarter_round};

/// Validated allocation policy paired with week bounds.
#[derive(Debug, Clone)]
pub struct WeekPlanner {
    policy: AllocationPolicy,
    week: WeekConfig,
    rounding: TieBreak,
}

impl WeekPlanner {
    /// # Errors
    ///
    /// Returns an error when either configuration is invalid.
    pub fn new(allocation: &AllocationConfig, week: &WeekConfig) -> Result<Self, ConfigError> {
        week.validate()?;
        let policy = AllocationPolicy::from_config(allocation)?;
        Ok(Self {
            policy,
            week: *week,
            rounding: allocation.rounding,
        })
    }

    #[must_use]
    pub const fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn week(&self) -> &WeekConfig {
        &self.week
    }

    /// Lazily generate the days of one week from `rng`.
    ///
    /// Each call starts a fresh sequence; the returned iterator is finite.
    pub fn days<'a, R: Rng + ?Sized>(&'a self, rng: &'a mut R) -> WeekPlan<'a, R> {
        log::info!(
            "Generating {} day(s) worth of timesheets with a minimum of {} hours and a maximum of {} hours",
            self.week.days_in_week,
            self.week.min_daily_hours,
            self.week.max_daily_hours
        );
        WeekPlan {
            planner: self,
            rng,
            remaining: self.week.days_in_week,
        }
    }

    /// Collect a whole week eagerly.
    ///
    /// # Errors
    ///
    /// Returns the first allocation failure encountered.
    pub fn plan_week<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<DailyDistribution>, AllocationError> {
        self.days(rng).collect()
    }

    fn draw_daily_hours<R: Rng + ?Sized>(&self, rng: &mut R) -> Quarters {
        let (min, max) = (self.week.min_daily_hours, self.week.max_daily_hours);
        let raw = if max > min {
            rng.gen_range(min..=max)
        } else {
            min
        };
        quarter_round(raw, self.rounding)
    }
}

/// Iterator over one week's daily distributions.
pub struct WeekPlan<'a, R: Rng + ?Sized> {
    planner: &'a WeekPlanner,
    rng: &'a mut R,
    remaining: u32,
}

impl<R: Rng + ?Sized> Iterator for WeekPlan<'_, R> {
    type Item = Result<DailyDistribution, AllocationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let daily_hours = self.planner.draw_daily_hours(self.rng);
        Some(self.planner.policy.daily_distribution(daily_hours, self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn planner(days: u32) -> WeekPlanner {
        let week = WeekConfig {
            days_in_week: days,
            ..WeekConfig::default()
        };
        WeekPlanner::new(&AllocationConfig::default(), &week).unwrap()
    }

    #[test]
    fn yields_configured_number_of_days() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(planner(5).days(&mut rng).count(), 5);
        assert_eq!(planner(0).days(&mut rng).count(), 0);
        assert_eq!(planner(3).days(&mut rng).size_hint(), (3, Some(3)));
    }

    #[test]
    fn daily_totals_stay_within_bounds() {
        let planner = planner(5);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        for _ in 0..50 {
            for day in planner.plan_week(&mut rng).unwrap() {
                assert!(day.target_hours >= Quarters::from_whole(8));
                assert!(day.target_hours <= Quarters::from_whole(13));
            }
        }
    }

    #[test]
    fn equal_bounds_skip_sampling() {
        let week = WeekConfig {
            min_daily_hours: 9.5,
            max_daily_hours: 9.5,
            days_in_week: 2,
        };
        let planner = WeekPlanner::new(&AllocationConfig::default(), &week).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for day in planner.plan_week(&mut rng).unwrap() {
            assert_eq!(day.target_hours, Quarters::from_quarters(38));
        }
    }

    #[test]
    fn same_seed_reproduces_week() {
        let planner = planner(5);
        let first = planner.plan_week(&mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        let second = planner.plan_week(&mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_invalid_week() {
        let week = WeekConfig {
            min_daily_hours: 13.0,
            max_daily_hours: 8.0,
            days_in_week: 5,
        };
        assert!(matches!(
            WeekPlanner::new(&AllocationConfig::default(), &week),
            Err(ConfigError::HoursMinExceedsMax { .. })
        ));
    }
}
