//! Step economy: earned steps, the banked balance, and the trail ledger.

pub mod economy;

pub use economy::{DailySteps, StepEconomy};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One day's entry in the trail ledger. Keyed by `(user, date)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTrailEntry {
    pub date: NaiveDate,
    pub steps_earned: u32,
    pub steps_invested: u32,
    pub productive_minutes: f64,
    pub unproductive_minutes: f64,
}

/// A user's trail state. Created on the first step calculation, mutated
/// once per day by the step economy, never deleted.
///
/// Invariants:
/// - `total_steps_earned == Σ history[i].steps_earned`
/// - `current_tile == Σ history[i].steps_invested`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailProgress {
    pub user_id: String,
    /// Cumulative invested steps (trail position).
    pub current_tile: u32,
    /// Earned steps not yet invested.
    pub steps_banked: u32,
    /// Monotonic sum of all historical earned steps.
    pub total_steps_earned: u32,
    /// Append-only daily ledger, ordered by date.
    pub history: Vec<DailyTrailEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
