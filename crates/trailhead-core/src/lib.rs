//! # Trailhead Core Library
//!
//! This library provides the core business logic for the Trailhead progress
//! engine. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any GUI being a thin layer
//! over the same core library.
//!
//! ## Architecture
//!
//! - **Goals**: Goal models, period arithmetic, log ingestion, and streak
//!   crediting (at most one credit per period)
//! - **Usage**: App classification with waste scoring, time-of-day factors,
//!   and daily productive/wasted aggregation
//! - **Steps**: The step economy converting productive time and completed
//!   goals into banked steps, plus the trail investment ledger
//! - **Storage**: SQLite-based state storage and TOML-based configuration
//! - **Sweeps**: Nightly streak reset and per-user daily rollup
//!
//! ## Key Components
//!
//! - [`record_log`]: Ingest a progress observation and evaluate the streak
//! - [`UsageClassifier`]: Local table, substring, and remote-model lookup
//! - [`StepEconomy`]: Daily step calculation, banking, and investment
//! - [`Database`]: Goal, log, usage, and ledger persistence

pub mod error;
pub mod goal;
pub mod steps;
pub mod storage;
pub mod sweep;
pub mod usage;

pub use error::{ConfigError, CoreError, DatabaseError, Result};
pub use goal::{
    record_log, Goal, GoalCategory, GoalFrequency, GoalLog, HealthMetric, LogOutcome, LogRequest,
    LogSource, NewGoal,
};
pub use steps::{DailySteps, DailyTrailEntry, StepEconomy, TrailProgress};
pub use storage::{Config, Database};
pub use sweep::{reset_missed, rollup_all, SweepReport};
pub use usage::{
    DailyUsageSummary, HttpClassifier, RemoteClassifier, UsageClassifier, UsageEvent,
};
