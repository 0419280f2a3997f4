//! Step economy: converting productive time and completed goals into steps,
//! and managing the banked/invested trail ledger.
//!
//! Steps are earned once per user per day (`apply_daily_calculation`) and
//! spent by investing banked steps into the trail (`invest_steps`). The
//! daily application is idempotent per `(user, date)`: a re-run updates the
//! day's ledger entry in place by delta and never appends a duplicate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{DailyTrailEntry, TrailProgress};
use crate::error::{CoreError, DatabaseError, Result};
use crate::goal::period::{midnight, period_bounds};
use crate::storage::{Database, EconomyConfig};
use crate::usage::{aggregate, UsageClassifier};

/// Steps earned for one day, before banking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySteps {
    pub date: NaiveDate,
    /// One step per full hour of net productive time.
    pub steps_from_time: u32,
    /// Fixed award per goal whose period target is met.
    pub steps_from_goals: u32,
    pub total_steps: u32,
    pub productive_minutes: f64,
    pub unproductive_minutes: f64,
    pub completed_goals: u32,
}

/// Step conversion rates and ledger operations.
pub struct StepEconomy {
    steps_per_goal: u32,
    minutes_per_step: u32,
}

impl StepEconomy {
    /// Default rates: 3 steps per completed goal, one step per 60 productive
    /// minutes.
    pub fn new() -> Self {
        Self {
            steps_per_goal: 3,
            minutes_per_step: 60,
        }
    }

    pub fn with_config(config: &EconomyConfig) -> Self {
        Self {
            steps_per_goal: config.steps_per_goal,
            minutes_per_step: config.minutes_per_step.max(1),
        }
    }

    /// Compute the steps a user earned on `date` from productive screen
    /// time and completed goals. Read-only; does not touch the ledger.
    pub fn calculate_daily_steps(
        &self,
        db: &Database,
        classifier: &UsageClassifier,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<DailySteps> {
        let events = db.usage_events_for_day(user_id, date)?;
        let summary = aggregate(classifier, date, &events);
        let steps_from_time = (summary.productive_minutes / f64::from(self.minutes_per_step))
            .floor()
            .max(0.0) as u32;

        let mut completed_goals = 0u32;
        for goal in db.active_goals(user_id)? {
            let (start, end) = period_bounds(goal.frequency, midnight(date));
            let period_total = db.sum_logs_between(&goal.id, start, end)?;
            if period_total >= goal.target_value {
                completed_goals += 1;
            }
        }

        let steps_from_goals = completed_goals * self.steps_per_goal;
        Ok(DailySteps {
            date,
            steps_from_time,
            steps_from_goals,
            total_steps: steps_from_time + steps_from_goals,
            productive_minutes: summary.productive_minutes,
            unproductive_minutes: summary.unproductive_minutes,
            completed_goals,
        })
    }

    /// Bank the day's earned steps into the trail ledger.
    ///
    /// Idempotent per `(user, date)`: when the day's entry already exists,
    /// it is updated in place and the banked/total counters move by the
    /// delta only. `steps_invested` for the day is never touched here.
    pub fn apply_daily_calculation(
        &self,
        db: &Database,
        classifier: &UsageClassifier,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<TrailProgress> {
        let steps = self.calculate_daily_steps(db, classifier, user_id, date)?;
        let now = midnight(date);

        let tx = db
            .conn()
            .unchecked_transaction()
            .map_err(DatabaseError::from)?;

        db.init_trail(user_id, now)?;
        let progress = self.load_trail(db, user_id)?;

        let previous_earned = db
            .history_entry(user_id, date)?
            .map(|e| e.steps_earned)
            .unwrap_or(0);
        let existing_invested = db
            .history_entry(user_id, date)?
            .map(|e| e.steps_invested)
            .unwrap_or(0);

        db.upsert_history_entry(
            user_id,
            &DailyTrailEntry {
                date,
                steps_earned: steps.total_steps,
                steps_invested: existing_invested,
                productive_minutes: steps.productive_minutes,
                unproductive_minutes: steps.unproductive_minutes,
            },
        )?;

        // Usage events and logs are append-only, so a recalculation can only
        // raise the day's total; saturate anyway rather than underflow.
        let gained = steps.total_steps.saturating_sub(previous_earned);
        let lost = previous_earned.saturating_sub(steps.total_steps);
        let steps_banked = (progress.steps_banked + gained).saturating_sub(lost);
        let total_earned = (progress.total_steps_earned + gained).saturating_sub(lost);

        db.update_trail(
            user_id,
            progress.current_tile,
            steps_banked,
            total_earned,
            now,
        )?;

        tx.commit().map_err(DatabaseError::from)?;

        self.load_trail(db, user_id)
    }

    /// Move `amount` banked steps onto the trail, recording the spend
    /// against the current day's ledger entry (created first if absent).
    ///
    /// # Errors
    /// `InsufficientSteps` if `amount` exceeds the banked balance.
    pub fn invest_steps(
        &self,
        db: &Database,
        classifier: &UsageClassifier,
        user_id: &str,
        amount: u32,
        as_of: DateTime<Utc>,
    ) -> Result<TrailProgress> {
        let today = as_of.date_naive();
        if db.history_entry(user_id, today)?.is_none() {
            self.apply_daily_calculation(db, classifier, user_id, today)?;
        }

        let tx = db
            .conn()
            .unchecked_transaction()
            .map_err(DatabaseError::from)?;

        let progress = self.load_trail(db, user_id)?;
        if amount > progress.steps_banked {
            return Err(CoreError::InsufficientSteps {
                requested: amount,
                available: progress.steps_banked,
            });
        }

        let entry = db
            .history_entry(user_id, today)?
            .ok_or_else(|| CoreError::NotFound {
                kind: "trail history entry",
                id: today.to_string(),
            })?;

        db.upsert_history_entry(
            user_id,
            &DailyTrailEntry {
                steps_invested: entry.steps_invested + amount,
                ..entry
            },
        )?;
        db.update_trail(
            user_id,
            progress.current_tile + amount,
            progress.steps_banked - amount,
            progress.total_steps_earned,
            as_of,
        )?;

        tx.commit().map_err(DatabaseError::from)?;

        self.load_trail(db, user_id)
    }

    /// Read surface for a user's trail, creating nothing.
    pub fn trail_progress(&self, db: &Database, user_id: &str) -> Result<Option<TrailProgress>> {
        Ok(db.trail_progress(user_id)?)
    }

    fn load_trail(&self, db: &Database, user_id: &str) -> Result<TrailProgress> {
        db.trail_progress(user_id)?.ok_or_else(|| CoreError::NotFound {
            kind: "trail progress",
            id: user_id.to_string(),
        })
    }
}

impl Default for StepEconomy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::{ingest, LogSource, NewGoal};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 8).unwrap()
    }

    /// 240 minutes of Notion (waste 0.2) at 14:00 -> 192 productive minutes.
    fn seed_productive_time(db: &Database) {
        db.record_usage_event(
            "u1",
            "Notion",
            "productivity",
            240.0,
            true,
            ts("2026-02-08T14:00:00+00:00"),
        )
        .unwrap();
    }

    fn seed_goals(db: &Database, met: usize, total: usize) {
        for i in 0..total {
            let goal = db
                .create_goal(
                    "u1",
                    NewGoal {
                        target_value: 1.0,
                        ..NewGoal::manual(&format!("Goal {i}"))
                    },
                    ts("2026-02-01T00:00:00+00:00"),
                )
                .unwrap();
            if i < met {
                ingest::record_log(
                    db,
                    "u1",
                    ingest::LogRequest::new(&goal.id, 1.0, LogSource::Manual),
                    ts("2026-02-08T10:00:00+00:00"),
                )
                .unwrap();
            }
        }
    }

    #[test]
    fn test_step_formula() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);
        seed_goals(&db, 2, 3);

        let steps = StepEconomy::new()
            .calculate_daily_steps(&db, &UsageClassifier::new(), "u1", day())
            .unwrap();

        assert!((steps.productive_minutes - 192.0).abs() < 1e-9);
        assert_eq!(steps.steps_from_time, 3);
        assert_eq!(steps.completed_goals, 2);
        assert_eq!(steps.steps_from_goals, 6);
        assert_eq!(steps.total_steps, 9);
    }

    #[test]
    fn test_no_activity_earns_nothing() {
        let db = Database::open_memory().unwrap();
        let steps = StepEconomy::new()
            .calculate_daily_steps(&db, &UsageClassifier::new(), "u1", day())
            .unwrap();
        assert_eq!(steps.total_steps, 0);
    }

    #[test]
    fn test_apply_is_idempotent_per_day() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);
        seed_goals(&db, 2, 3);

        let economy = StepEconomy::new();
        let classifier = UsageClassifier::new();
        let first = economy
            .apply_daily_calculation(&db, &classifier, "u1", day())
            .unwrap();
        assert_eq!(first.steps_banked, 9);
        assert_eq!(first.total_steps_earned, 9);
        assert_eq!(first.history.len(), 1);

        let second = economy
            .apply_daily_calculation(&db, &classifier, "u1", day())
            .unwrap();
        assert_eq!(second.steps_banked, 9);
        assert_eq!(second.total_steps_earned, 9);
        assert_eq!(second.history.len(), 1);
    }

    #[test]
    fn test_reapply_after_new_activity_banks_the_delta() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);
        let economy = StepEconomy::new();
        let classifier = UsageClassifier::new();

        let first = economy
            .apply_daily_calculation(&db, &classifier, "u1", day())
            .unwrap();
        assert_eq!(first.total_steps_earned, 3);

        // Another productive hour lands later the same day
        db.record_usage_event(
            "u1",
            "Notion",
            "productivity",
            75.0,
            true,
            ts("2026-02-08T19:00:00+00:00"),
        )
        .unwrap();

        let second = economy
            .apply_daily_calculation(&db, &classifier, "u1", day())
            .unwrap();
        // 252 productive minutes now: 4 steps, delta of 1 banked
        assert_eq!(second.total_steps_earned, 4);
        assert_eq!(second.steps_banked, 4);
        assert_eq!(second.history.len(), 1);
        assert_eq!(second.history[0].steps_earned, 4);
    }

    #[test]
    fn test_apply_timestamps_derive_from_the_applied_day() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);

        // Applying a past day must not leak wall-clock time into the ledger
        let progress = StepEconomy::new()
            .apply_daily_calculation(&db, &UsageClassifier::new(), "u1", day())
            .unwrap();
        assert_eq!(progress.created_at, midnight(day()));
        assert_eq!(progress.updated_at, midnight(day()));
    }

    #[test]
    fn test_invest_moves_banked_to_tile() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);
        seed_goals(&db, 2, 3);

        let economy = StepEconomy::new();
        let classifier = UsageClassifier::new();
        economy
            .apply_daily_calculation(&db, &classifier, "u1", day())
            .unwrap();

        let before = economy.trail_progress(&db, "u1").unwrap().unwrap();
        let conserved = before.steps_banked + before.current_tile;

        let after = economy
            .invest_steps(&db, &classifier, "u1", 4, ts("2026-02-08T20:00:00+00:00"))
            .unwrap();
        assert_eq!(after.steps_banked, 5);
        assert_eq!(after.current_tile, 4);
        assert_eq!(after.steps_banked + after.current_tile, conserved);
        assert_eq!(after.history[0].steps_invested, 4);
        // Earned total is untouched by investing
        assert_eq!(after.total_steps_earned, before.total_steps_earned);
    }

    #[test]
    fn test_invest_rejects_overdraw() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);

        let economy = StepEconomy::new();
        let classifier = UsageClassifier::new();
        economy
            .apply_daily_calculation(&db, &classifier, "u1", day())
            .unwrap();

        let err = economy
            .invest_steps(&db, &classifier, "u1", 100, ts("2026-02-08T20:00:00+00:00"))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientSteps {
                requested: 100,
                available: 3,
            }
        ));

        // Balance unchanged after the failed invest
        let progress = economy.trail_progress(&db, "u1").unwrap().unwrap();
        assert_eq!(progress.steps_banked, 3);
        assert_eq!(progress.current_tile, 0);
    }

    #[test]
    fn test_invest_creates_todays_entry_if_absent() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);

        let economy = StepEconomy::new();
        let classifier = UsageClassifier::new();

        // No prior apply: invest runs the daily calculation first
        let after = economy
            .invest_steps(&db, &classifier, "u1", 2, ts("2026-02-08T20:00:00+00:00"))
            .unwrap();
        assert_eq!(after.history.len(), 1);
        assert_eq!(after.steps_banked, 1);
        assert_eq!(after.current_tile, 2);
    }

    #[test]
    fn test_ledger_invariants_hold() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);
        seed_goals(&db, 1, 1);

        let economy = StepEconomy::new();
        let classifier = UsageClassifier::new();
        economy
            .apply_daily_calculation(&db, &classifier, "u1", day())
            .unwrap();
        let progress = economy
            .invest_steps(&db, &classifier, "u1", 3, ts("2026-02-08T20:00:00+00:00"))
            .unwrap();

        let earned_sum: u32 = progress.history.iter().map(|e| e.steps_earned).sum();
        let invested_sum: u32 = progress.history.iter().map(|e| e.steps_invested).sum();
        assert_eq!(progress.total_steps_earned, earned_sum);
        assert_eq!(progress.current_tile, invested_sum);
    }

    #[test]
    fn test_custom_rates() {
        let db = Database::open_memory().unwrap();
        seed_productive_time(&db);
        seed_goals(&db, 1, 1);

        let economy = StepEconomy::with_config(&EconomyConfig {
            steps_per_goal: 5,
            minutes_per_step: 30,
        });
        let steps = economy
            .calculate_daily_steps(&db, &UsageClassifier::new(), "u1", day())
            .unwrap();
        // 192 / 30 = 6 full half-hours; one goal met at 5 steps
        assert_eq!(steps.steps_from_time, 6);
        assert_eq!(steps.steps_from_goals, 5);
    }
}
