//! Timefill allocation engine
//!
//! Platform-agnostic generation of plausible weekly timesheets: exact quarter-hour
//! rounding, two interchangeable category allocation policies, and a lazy weekly planner.
//! This crate has no browser or I/O dependencies.

pub mod allocation;
pub mod category;
pub mod config;
pub mod quarter;
pub mod rng;
pub mod week;

// Re-export commonly used types
pub use allocation::{
    AllocationError, AllocationPolicy, DailyDistribution, PercentageAllocation, SeededPolicy,
    TwoCategoryPolicy, hours_for_share,
};
pub use category::{Category, CategoryMap};
pub use config::{
    AllocationConfig, ConfigError, DrawShape, FloorRange, PolicyConfig, TriangularBounds,
    WeekConfig,
};
pub use quarter::{Quarters, TieBreak, quarter_round};
pub use rng::plan_rng;
pub use week::{WeekPlan, WeekPlanner};
