//! Goal log ingestion.
//!
//! Two write modes, selected by the goal's `auto_track` flag (not by the
//! log's source):
//!
//! - accumulating (default): every call appends a log; the period total is
//!   the sum of all logs in the window.
//! - replacing (`auto_track = true`): device syncs report cumulative daily
//!   totals, so the day's existing device log is overwritten in place
//!   instead of accumulating. Only one device log exists per goal per day.
//!
//! Every successful write triggers streak evaluation synchronously.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::midnight;
use super::streak::{evaluate, Evaluation};
use super::{GoalLog, LogSource};
use crate::error::{CoreError, Result};
use crate::storage::Database;

/// A single progress observation to record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRequest {
    pub goal_id: String,
    pub value: f64,
    #[serde(default)]
    pub note: Option<String>,
    pub source: LogSource,
    /// Calendar day the observation belongs to. Defaults to `now`'s date;
    /// device syncs use it to backfill earlier days.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl LogRequest {
    pub fn new(goal_id: &str, value: f64, source: LogSource) -> Self {
        Self {
            goal_id: goal_id.to_string(),
            value,
            note: None,
            source,
            date: None,
        }
    }
}

/// Result of recording a log: the written log id plus the synchronous
/// streak evaluation for the owning goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogOutcome {
    pub log_id: String,
    pub evaluation: Evaluation,
}

/// Record a progress observation for an active goal owned by `user_id`.
///
/// # Errors
/// - `NotFound` if the goal is absent, owned by someone else, or inactive
/// - `InvalidInput` if the value is negative or non-finite
/// - `InvalidSource` if the goal's metric is device-only and the source is
///   manual
pub fn record_log(
    db: &Database,
    user_id: &str,
    request: LogRequest,
    now: DateTime<Utc>,
) -> Result<LogOutcome> {
    let goal = db
        .find_goal(&request.goal_id, user_id)?
        .filter(|g| g.is_active)
        .ok_or_else(|| CoreError::NotFound {
            kind: "goal",
            id: request.goal_id.clone(),
        })?;

    if !request.value.is_finite() || request.value < 0.0 {
        return Err(CoreError::InvalidInput {
            field: "value",
            message: format!("must be finite and non-negative, got {}", request.value),
        });
    }

    if goal.metric.device_only() && request.source == LogSource::Manual {
        return Err(CoreError::InvalidSource {
            metric: goal.metric.as_str().to_string(),
        });
    }

    let day = request.date.unwrap_or_else(|| now.date_naive());

    let log_id = if goal.auto_track {
        // Replacing mode: overwrite the day's device log, else create it.
        match db.find_device_log(&goal.id, day)? {
            Some(existing) => {
                db.update_log_value(&existing.id, request.value)?;
                existing.id
            }
            None => {
                let log = GoalLog {
                    id: Uuid::new_v4().to_string(),
                    goal_id: goal.id.clone(),
                    user_id: user_id.to_string(),
                    value: request.value,
                    note: request.note,
                    source: LogSource::Device,
                    logged_at: midnight(day),
                };
                db.insert_log(&log)?;
                log.id
            }
        }
    } else {
        // Accumulating mode: always append.
        let logged_at = match request.date {
            Some(d) => midnight(d),
            None => now,
        };
        let log = GoalLog {
            id: Uuid::new_v4().to_string(),
            goal_id: goal.id.clone(),
            user_id: user_id.to_string(),
            value: request.value,
            note: request.note,
            source: request.source,
            logged_at,
        };
        db.insert_log(&log)?;
        log.id
    };

    let evaluation = evaluate(db, user_id, &goal.id, now)?;

    Ok(LogOutcome { log_id, evaluation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::{HealthMetric, NewGoal};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_manual_mode_accumulates() {
        let db = Database::open_memory().unwrap();
        let goal = db
            .create_goal(
                "u1",
                NewGoal {
                    target_value: 180.0,
                    ..NewGoal::manual("Study")
                },
                ts("2026-02-01T00:00:00+00:00"),
            )
            .unwrap();

        let first = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 83.0, LogSource::Manual),
            ts("2026-02-08T09:00:00+00:00"),
        )
        .unwrap();
        assert_eq!(first.evaluation.period_total, 83.0);
        assert!(!first.evaluation.met);

        let second = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 96.0, LogSource::Manual),
            ts("2026-02-08T15:00:00+00:00"),
        )
        .unwrap();
        assert_ne!(first.log_id, second.log_id);
        assert_eq!(second.evaluation.period_total, 179.0);
        assert!(!second.evaluation.met);
    }

    #[test]
    fn test_device_mode_replaces_same_day() {
        let db = Database::open_memory().unwrap();
        let goal = db
            .create_goal(
                "u1",
                NewGoal {
                    metric: HealthMetric::Steps,
                    auto_track: true,
                    target_value: 10_000.0,
                    ..NewGoal::manual("Walk")
                },
                ts("2026-02-01T00:00:00+00:00"),
            )
            .unwrap();

        let first = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 10.0, LogSource::Device),
            ts("2026-02-08T09:00:00+00:00"),
        )
        .unwrap();
        let second = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 25.0, LogSource::Device),
            ts("2026-02-08T15:00:00+00:00"),
        )
        .unwrap();

        // Same log, value replaced, not accumulated
        assert_eq!(first.log_id, second.log_id);
        assert_eq!(second.evaluation.period_total, 25.0);

        let day = NaiveDate::from_ymd_opt(2026, 2, 8).unwrap();
        let log = db.find_device_log(&goal.id, day).unwrap().unwrap();
        assert_eq!(log.value, 25.0);
    }

    #[test]
    fn test_device_mode_new_day_gets_new_log() {
        let db = Database::open_memory().unwrap();
        let goal = db
            .create_goal(
                "u1",
                NewGoal {
                    metric: HealthMetric::Steps,
                    auto_track: true,
                    target_value: 10_000.0,
                    ..NewGoal::manual("Walk")
                },
                ts("2026-02-01T00:00:00+00:00"),
            )
            .unwrap();

        let first = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 8_000.0, LogSource::Device),
            ts("2026-02-08T22:00:00+00:00"),
        )
        .unwrap();
        let second = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 2_000.0, LogSource::Device),
            ts("2026-02-09T07:00:00+00:00"),
        )
        .unwrap();

        assert_ne!(first.log_id, second.log_id);
        assert_eq!(second.evaluation.period_total, 2_000.0);
    }

    #[test]
    fn test_sleep_rejects_manual_source() {
        let db = Database::open_memory().unwrap();
        let goal = db
            .create_goal(
                "u1",
                NewGoal {
                    metric: HealthMetric::SleepDuration,
                    auto_track: true,
                    target_value: 8.0,
                    ..NewGoal::manual("Sleep")
                },
                ts("2026-02-01T00:00:00+00:00"),
            )
            .unwrap();

        let err = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 7.5, LogSource::Manual),
            ts("2026-02-08T09:00:00+00:00"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSource { .. }));

        // The same value from the device is fine
        record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 7.5, LogSource::Device),
            ts("2026-02-08T09:00:00+00:00"),
        )
        .unwrap();
    }

    #[test]
    fn test_invalid_values_rejected() {
        let db = Database::open_memory().unwrap();
        let goal = db
            .create_goal("u1", NewGoal::manual("Read"), ts("2026-02-01T00:00:00+00:00"))
            .unwrap();
        let now = ts("2026-02-08T09:00:00+00:00");

        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = record_log(
                &db,
                "u1",
                LogRequest::new(&goal.id, bad, LogSource::Manual),
                now,
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::InvalidInput { field: "value", .. }));
        }
    }

    #[test]
    fn test_inactive_or_foreign_goal_is_not_found() {
        let db = Database::open_memory().unwrap();
        let goal = db
            .create_goal("u1", NewGoal::manual("Read"), ts("2026-02-01T00:00:00+00:00"))
            .unwrap();
        let now = ts("2026-02-08T09:00:00+00:00");

        // Wrong owner
        let err = record_log(
            &db,
            "u2",
            LogRequest::new(&goal.id, 1.0, LogSource::Manual),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));

        // Deactivated goal stops accruing logs
        db.deactivate_goal(&goal.id, "u1").unwrap();
        let err = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 1.0, LogSource::Manual),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_write_triggers_streak_evaluation() {
        let db = Database::open_memory().unwrap();
        let goal = db
            .create_goal(
                "u1",
                NewGoal {
                    target_value: 180.0,
                    ..NewGoal::manual("Study")
                },
                ts("2026-02-01T00:00:00+00:00"),
            )
            .unwrap();

        let outcome = record_log(
            &db,
            "u1",
            LogRequest::new(&goal.id, 192.0, LogSource::Manual),
            ts("2026-02-09T10:00:00+00:00"),
        )
        .unwrap();
        assert!(outcome.evaluation.met);
        assert!(outcome.evaluation.credited);

        let goal = db.find_goal(&goal.id, "u1").unwrap().unwrap();
        assert_eq!(goal.current_streak, 1);
    }
}
