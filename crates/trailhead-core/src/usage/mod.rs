//! App usage tracking: classification, waste scoring, daily aggregation.

pub mod aggregate;
pub mod classify;
pub mod remote;

pub use aggregate::{aggregate, AppUsage, DailyUsageSummary};
pub use classify::{time_factor, Classification, UsageAssessment, UsageClassifier};
pub use remote::{HttpClassifier, RemoteClassifier};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A recorded interval of app usage. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: i64,
    pub user_id: String,
    pub app_name: String,
    pub category: String,
    /// Interval length in minutes, > 0.
    pub duration_minutes: f64,
    pub is_productive: bool,
    pub occurred_at: DateTime<Utc>,
    /// Midnight-truncated calendar date of `occurred_at`.
    pub day: NaiveDate,
}
