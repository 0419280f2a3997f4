//! Integration tests for the log-to-streak pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use trailhead_core::goal::ingest::{record_log, LogRequest};
use trailhead_core::{
    reset_missed, Database, GoalFrequency, HealthMetric, LogSource, NewGoal,
};

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn test_partial_day_does_not_credit() {
    let db = Database::open_memory().unwrap();
    let goal = db
        .create_goal(
            "local",
            NewGoal {
                target_value: 180.0,
                target_unit: "min".to_string(),
                ..NewGoal::manual("Study")
            },
            ts("2026-02-01T00:00:00+00:00"),
        )
        .unwrap();

    // Two logs summing to 179: one short of target
    let first = record_log(
        &db,
        "local",
        LogRequest::new(&goal.id, 83.0, LogSource::Manual),
        ts("2026-02-08T09:00:00+00:00"),
    )
    .unwrap();
    assert!(!first.evaluation.met);

    let second = record_log(
        &db,
        "local",
        LogRequest::new(&goal.id, 96.0, LogSource::Manual),
        ts("2026-02-08T15:00:00+00:00"),
    )
    .unwrap();
    assert_eq!(second.evaluation.period_total, 179.0);
    assert!(!second.evaluation.met);
    assert!(!second.evaluation.credited);

    let g = db.find_goal(&goal.id, "local").unwrap().unwrap();
    assert_eq!(g.current_streak, 0);
}

#[test]
fn test_multi_day_streak_with_reset_and_recovery() {
    let db = Database::open_memory().unwrap();
    let goal = db
        .create_goal(
            "local",
            NewGoal {
                target_value: 60.0,
                target_unit: "min".to_string(),
                ..NewGoal::manual("Practice")
            },
            ts("2026-02-01T00:00:00+00:00"),
        )
        .unwrap();

    // Met on the 6th, 7th, 8th
    for day in ["2026-02-06", "2026-02-07", "2026-02-08"] {
        let outcome = record_log(
            &db,
            "local",
            LogRequest::new(&goal.id, 75.0, LogSource::Manual),
            ts(&format!("{day}T18:00:00+00:00")),
        )
        .unwrap();
        assert!(outcome.evaluation.credited);
    }
    let g = db.find_goal(&goal.id, "local").unwrap().unwrap();
    assert_eq!(g.current_streak, 3);
    assert_eq!(g.longest_streak, 3);

    // Nothing on the 9th; the nightly sweep on the 10th resets
    let report = reset_missed(&db, ts("2026-02-10T00:05:00+00:00")).unwrap();
    assert_eq!(report.updated, 1);
    let g = db.find_goal(&goal.id, "local").unwrap().unwrap();
    assert_eq!(g.current_streak, 0);
    assert_eq!(g.longest_streak, 3);

    // Recovery on the 10th starts a fresh streak without touching longest
    record_log(
        &db,
        "local",
        LogRequest::new(&goal.id, 80.0, LogSource::Manual),
        ts("2026-02-10T20:00:00+00:00"),
    )
    .unwrap();
    let g = db.find_goal(&goal.id, "local").unwrap().unwrap();
    assert_eq!(g.current_streak, 1);
    assert_eq!(g.longest_streak, 3);
    assert_eq!(g.total_completions, 4);
}

#[test]
fn test_repeated_logs_after_credit_do_not_double_count() {
    let db = Database::open_memory().unwrap();
    let goal = db
        .create_goal(
            "local",
            NewGoal {
                target_value: 30.0,
                target_unit: "min".to_string(),
                ..NewGoal::manual("Read")
            },
            ts("2026-02-01T00:00:00+00:00"),
        )
        .unwrap();

    let outcome = record_log(
        &db,
        "local",
        LogRequest::new(&goal.id, 45.0, LogSource::Manual),
        ts("2026-02-08T09:00:00+00:00"),
    )
    .unwrap();
    assert!(outcome.evaluation.credited);

    // More logging the same day keeps the total growing but never
    // re-credits the period
    for hour in ["12", "15", "21"] {
        let outcome = record_log(
            &db,
            "local",
            LogRequest::new(&goal.id, 10.0, LogSource::Manual),
            ts(&format!("2026-02-08T{hour}:00:00+00:00")),
        )
        .unwrap();
        assert!(outcome.evaluation.met);
        assert!(!outcome.evaluation.credited);
    }

    let g = db.find_goal(&goal.id, "local").unwrap().unwrap();
    assert_eq!(g.current_streak, 1);
    assert_eq!(g.total_completions, 1);
}

#[test]
fn test_device_sync_backfills_and_credits_past_day() {
    let db = Database::open_memory().unwrap();
    let goal = db
        .create_goal(
            "local",
            NewGoal {
                metric: HealthMetric::Steps,
                auto_track: true,
                target_value: 8_000.0,
                ..NewGoal::manual("Walk")
            },
            ts("2026-02-01T00:00:00+00:00"),
        )
        .unwrap();

    // Morning sync reports a partial total, evening sync replaces it
    let morning = record_log(
        &db,
        "local",
        LogRequest {
            date: Some(NaiveDate::from_ymd_opt(2026, 2, 8).unwrap()),
            ..LogRequest::new(&goal.id, 3_500.0, LogSource::Device)
        },
        ts("2026-02-08T09:00:00+00:00"),
    )
    .unwrap();
    assert!(!morning.evaluation.met);

    let evening = record_log(
        &db,
        "local",
        LogRequest {
            date: Some(NaiveDate::from_ymd_opt(2026, 2, 8).unwrap()),
            ..LogRequest::new(&goal.id, 9_200.0, LogSource::Device)
        },
        ts("2026-02-08T21:00:00+00:00"),
    )
    .unwrap();
    assert_eq!(morning.log_id, evening.log_id);
    assert_eq!(evening.evaluation.period_total, 9_200.0);
    assert!(evening.evaluation.credited);
}

#[test]
fn test_weekly_streak_survives_daily_sweep() {
    let db = Database::open_memory().unwrap();
    let goal = db
        .create_goal(
            "local",
            NewGoal {
                frequency: GoalFrequency::Weekly,
                target_value: 3.0,
                ..NewGoal::manual("Workouts")
            },
            ts("2026-02-01T00:00:00+00:00"),
        )
        .unwrap();

    // 2026-02-02 is a Monday; three workouts credit the week
    for day in ["2026-02-02", "2026-02-04", "2026-02-06"] {
        record_log(
            &db,
            "local",
            LogRequest::new(&goal.id, 1.0, LogSource::Manual),
            ts(&format!("{day}T07:00:00+00:00")),
        )
        .unwrap();
    }
    let g = db.find_goal(&goal.id, "local").unwrap().unwrap();
    assert_eq!(g.current_streak, 1);

    // Nightly daily-goal sweeps through the week leave it alone
    for day in ["2026-02-05", "2026-02-07", "2026-02-08"] {
        reset_missed(&db, ts(&format!("{day}T00:05:00+00:00"))).unwrap();
    }
    let g = db.find_goal(&goal.id, "local").unwrap().unwrap();
    assert_eq!(g.current_streak, 1);
}
