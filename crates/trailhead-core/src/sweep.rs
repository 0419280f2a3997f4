//! Nightly maintenance sweeps.
//!
//! Two passes run shortly after midnight: `reset_missed` zeroes the current
//! streak of every active daily goal whose previous day fell short of
//! target, and `rollup_all` banks the previous day's steps for every user
//! with recorded activity. Both isolate failures per item so one bad row
//! cannot stall the rest of the sweep.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::goal::period::midnight;
use crate::steps::StepEconomy;
use crate::storage::Database;
use crate::usage::UsageClassifier;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Items examined, including ones that failed.
    pub processed: u32,
    /// Items whose streak was reset (or whose steps were banked).
    pub updated: u32,
    /// Ids of items that errored, skipped but reported.
    pub failed: Vec<String>,
}

impl SweepReport {
    fn new() -> Self {
        Self {
            processed: 0,
            updated: 0,
            failed: Vec::new(),
        }
    }
}

/// Zero the streak of every active daily goal that missed its target on the
/// day before `as_of`.
///
/// Goals whose yesterday total met the target are left alone, as are goals
/// already at streak zero. Per-goal failures are logged and collected in
/// the report instead of aborting the pass.
pub fn reset_missed(db: &Database, as_of: DateTime<Utc>) -> Result<SweepReport> {
    let yesterday = as_of.date_naive() - Duration::days(1);
    let start = midnight(yesterday);
    let end = start + Duration::days(1);

    let mut report = SweepReport::new();
    for goal in db.active_daily_goals()? {
        report.processed += 1;
        let outcome = db
            .sum_logs_between(&goal.id, start, end)
            .and_then(|total| {
                if total < goal.target_value && goal.current_streak > 0 {
                    db.reset_streak(&goal.id)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            });
        match outcome {
            Ok(true) => report.updated += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(goal_id = %goal.id, error = %e, "streak reset failed, skipping goal");
                report.failed.push(goal.id);
            }
        }
    }
    Ok(report)
}

/// Bank `date`'s earned steps for every user with any recorded activity.
///
/// Per-user failures are logged and collected; the pass continues.
pub fn rollup_all(
    db: &Database,
    classifier: &UsageClassifier,
    economy: &StepEconomy,
    date: NaiveDate,
) -> Result<SweepReport> {
    let mut report = SweepReport::new();
    for user_id in db.users_with_activity()? {
        report.processed += 1;
        match economy.apply_daily_calculation(db, classifier, &user_id, date) {
            Ok(_) => report.updated += 1,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "daily rollup failed, skipping user");
                report.failed.push(user_id);
            }
        }
    }
    Ok(report)
}
