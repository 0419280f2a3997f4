//! SQLite-backed storage for goals, logs, usage events, and the trail ledger.
//!
//! This is the collaborator surface the engine consumes: goal lookup by id
//! and owner, log append/update, usage queries by user and day, and trail
//! progress read/write. Timestamps are stored as RFC 3339 text (always
//! UTC, so lexical comparison matches chronological order); calendar days
//! as `YYYY-MM-DD`.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::data_dir;
use crate::error::DatabaseError;
use crate::goal::{Goal, GoalCategory, GoalFrequency, GoalLog, HealthMetric, LogSource, NewGoal};
use crate::steps::{DailyTrailEntry, TrailProgress};
use crate::usage::UsageEvent;

/// SQLite database for engine state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/trailhead/trailhead.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("trailhead.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS goals (
                    id                   TEXT PRIMARY KEY,
                    user_id              TEXT NOT NULL,
                    title                TEXT NOT NULL,
                    description          TEXT,
                    category             TEXT NOT NULL,
                    frequency            TEXT NOT NULL,
                    target_value         REAL NOT NULL,
                    target_unit          TEXT NOT NULL,
                    metric               TEXT NOT NULL,
                    auto_track           INTEGER NOT NULL DEFAULT 0,
                    deadline             TEXT,
                    total_target         REAL,
                    is_active            INTEGER NOT NULL DEFAULT 1,
                    current_streak       INTEGER NOT NULL DEFAULT 0,
                    longest_streak       INTEGER NOT NULL DEFAULT 0,
                    total_completions    INTEGER NOT NULL DEFAULT 0,
                    last_credited_period TEXT,
                    created_at           TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS goal_logs (
                    id        TEXT PRIMARY KEY,
                    goal_id   TEXT NOT NULL,
                    user_id   TEXT NOT NULL,
                    value     REAL NOT NULL,
                    note      TEXT,
                    source    TEXT NOT NULL,
                    logged_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS usage_events (
                    id               INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id          TEXT NOT NULL,
                    app_name         TEXT NOT NULL,
                    category         TEXT NOT NULL,
                    duration_minutes REAL NOT NULL,
                    is_productive    INTEGER NOT NULL,
                    occurred_at      TEXT NOT NULL,
                    day              TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS trail_progress (
                    user_id            TEXT PRIMARY KEY,
                    current_tile       INTEGER NOT NULL DEFAULT 0,
                    steps_banked       INTEGER NOT NULL DEFAULT 0,
                    total_steps_earned INTEGER NOT NULL DEFAULT 0,
                    created_at         TEXT NOT NULL,
                    updated_at         TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS trail_history (
                    user_id              TEXT NOT NULL,
                    day                  TEXT NOT NULL,
                    steps_earned         INTEGER NOT NULL DEFAULT 0,
                    steps_invested       INTEGER NOT NULL DEFAULT 0,
                    productive_minutes   REAL NOT NULL DEFAULT 0,
                    unproductive_minutes REAL NOT NULL DEFAULT 0,
                    PRIMARY KEY (user_id, day)
                );

                CREATE INDEX IF NOT EXISTS idx_goals_user_active ON goals(user_id, is_active);
                CREATE INDEX IF NOT EXISTS idx_goal_logs_goal_at ON goal_logs(goal_id, logged_at);
                CREATE INDEX IF NOT EXISTS idx_usage_events_user_day ON usage_events(user_id, day);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Goals ────────────────────────────────────────────────────────

    /// Insert a goal for `user_id` with metric-derived unit/category
    /// defaults applied and streak counters zeroed.
    pub fn create_goal(
        &self,
        user_id: &str,
        new: NewGoal,
        now: DateTime<Utc>,
    ) -> Result<Goal, DatabaseError> {
        let new = new.with_metric_defaults();
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: new.title,
            description: new.description,
            category: new.category,
            frequency: new.frequency,
            target_value: new.target_value,
            target_unit: new.target_unit,
            metric: new.metric,
            auto_track: new.auto_track,
            deadline: new.deadline,
            total_target: new.total_target,
            is_active: true,
            current_streak: 0,
            longest_streak: 0,
            total_completions: 0,
            last_credited_period: None,
            created_at: now,
        };
        self.conn.execute(
            "INSERT INTO goals (id, user_id, title, description, category, frequency,
                                target_value, target_unit, metric, auto_track, deadline,
                                total_target, is_active, current_streak, longest_streak,
                                total_completions, last_credited_period, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, 0, 0, 0, NULL, ?13)",
            params![
                goal.id,
                goal.user_id,
                goal.title,
                goal.description,
                goal.category.as_str(),
                goal.frequency.as_str(),
                goal.target_value,
                goal.target_unit,
                goal.metric.as_str(),
                goal.auto_track,
                goal.deadline.map(|d| d.to_rfc3339()),
                goal.total_target,
                goal.created_at.to_rfc3339(),
            ],
        )?;
        Ok(goal)
    }

    /// Look up a goal by id, scoped to its owner.
    pub fn find_goal(&self, goal_id: &str, user_id: &str) -> Result<Option<Goal>, DatabaseError> {
        let goal = self
            .conn
            .query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1 AND user_id = ?2"),
                params![goal_id, user_id],
                goal_from_row,
            )
            .optional()?;
        Ok(goal)
    }

    /// All active goals for a user.
    pub fn active_goals(&self, user_id: &str) -> Result<Vec<Goal>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 AND is_active = 1
             ORDER BY created_at"
        ))?;
        let goals = stmt
            .query_map(params![user_id], goal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// All active daily goals across users, for the nightly sweep.
    pub fn active_daily_goals(&self) -> Result<Vec<Goal>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE is_active = 1 AND frequency = 'daily'"
        ))?;
        let goals = stmt
            .query_map([], goal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Mark a goal inactive. Its logs stay queryable; new writes are
    /// rejected at the ingest layer. Returns false if no such goal.
    pub fn deactivate_goal(&self, goal_id: &str, user_id: &str) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE goals SET is_active = 0 WHERE id = ?1 AND user_id = ?2",
            params![goal_id, user_id],
        )?;
        Ok(n > 0)
    }

    /// Write streak state after a credit.
    pub fn update_streak(
        &self,
        goal_id: &str,
        current_streak: u32,
        longest_streak: u32,
        total_completions: u32,
        last_credited_period: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE goals SET current_streak = ?2, longest_streak = ?3,
                              total_completions = ?4, last_credited_period = ?5
             WHERE id = ?1",
            params![
                goal_id,
                current_streak,
                longest_streak,
                total_completions,
                last_credited_period.map(|d| d.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Zero a goal's current streak (missed period). Longest streak and
    /// completion count are untouched.
    pub fn reset_streak(&self, goal_id: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE goals SET current_streak = 0 WHERE id = ?1",
            params![goal_id],
        )?;
        Ok(())
    }

    // ── Goal logs ────────────────────────────────────────────────────

    pub fn insert_log(&self, log: &GoalLog) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO goal_logs (id, goal_id, user_id, value, note, source, logged_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.id,
                log.goal_id,
                log.user_id,
                log.value,
                log.note,
                log.source.as_str(),
                log.logged_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Overwrite a log's value in place (the device-upsert path).
    pub fn update_log_value(&self, log_id: &str, value: f64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE goal_logs SET value = ?2 WHERE id = ?1",
            params![log_id, value],
        )?;
        Ok(())
    }

    /// Find the goal's device-sourced log dated within `day`, if any.
    pub fn find_device_log(
        &self,
        goal_id: &str,
        day: NaiveDate,
    ) -> Result<Option<GoalLog>, DatabaseError> {
        let start = crate::goal::period::midnight(day);
        let end = start + chrono::Duration::days(1);
        let log = self
            .conn
            .query_row(
                "SELECT id, goal_id, user_id, value, note, source, logged_at
                 FROM goal_logs
                 WHERE goal_id = ?1 AND source = 'device'
                   AND logged_at >= ?2 AND logged_at < ?3
                 LIMIT 1",
                params![goal_id, start.to_rfc3339(), end.to_rfc3339()],
                log_from_row,
            )
            .optional()?;
        Ok(log)
    }

    /// Sum of log values for a goal with `logged_at >= since`.
    pub fn sum_logs_since(
        &self,
        goal_id: &str,
        since: DateTime<Utc>,
    ) -> Result<f64, DatabaseError> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(value), 0) FROM goal_logs
             WHERE goal_id = ?1 AND logged_at >= ?2",
            params![goal_id, since.to_rfc3339()],
            |row| row.get::<_, f64>(0),
        )?;
        Ok(total)
    }

    /// Sum of log values for a goal within `[start, end)`.
    pub fn sum_logs_between(
        &self,
        goal_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, DatabaseError> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(value), 0) FROM goal_logs
             WHERE goal_id = ?1 AND logged_at >= ?2 AND logged_at < ?3",
            params![goal_id, start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get::<_, f64>(0),
        )?;
        Ok(total)
    }

    /// Logs for a goal since an instant, oldest first. Used by the goal
    /// history read surface.
    pub fn logs_for_goal_since(
        &self,
        goal_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<GoalLog>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, goal_id, user_id, value, note, source, logged_at
             FROM goal_logs
             WHERE goal_id = ?1 AND logged_at >= ?2
             ORDER BY logged_at",
        )?;
        let logs = stmt
            .query_map(params![goal_id, since.to_rfc3339()], log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    // ── Usage events ─────────────────────────────────────────────────

    /// Record an app-usage interval. The calendar day is derived from
    /// `occurred_at` by midnight truncation.
    pub fn record_usage_event(
        &self,
        user_id: &str,
        app_name: &str,
        category: &str,
        duration_minutes: f64,
        is_productive: bool,
        occurred_at: DateTime<Utc>,
    ) -> Result<UsageEvent, DatabaseError> {
        let day = occurred_at.date_naive();
        self.conn.execute(
            "INSERT INTO usage_events (user_id, app_name, category, duration_minutes,
                                       is_productive, occurred_at, day)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                app_name,
                category,
                duration_minutes,
                is_productive,
                occurred_at.to_rfc3339(),
                day.to_string(),
            ],
        )?;
        Ok(UsageEvent {
            id: self.conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            app_name: app_name.to_string(),
            category: category.to_string(),
            duration_minutes,
            is_productive,
            occurred_at,
            day,
        })
    }

    /// All usage events for a user on a calendar day, oldest first.
    pub fn usage_events_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<UsageEvent>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, app_name, category, duration_minutes,
                    is_productive, occurred_at, day
             FROM usage_events
             WHERE user_id = ?1 AND day = ?2
             ORDER BY occurred_at",
        )?;
        let events = stmt
            .query_map(params![user_id, day.to_string()], event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// Distinct user ids with any recorded goal or usage activity.
    pub fn users_with_activity(&self) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT user_id FROM goals
             UNION
             SELECT DISTINCT user_id FROM usage_events
             ORDER BY user_id",
        )?;
        let users = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    // ── Trail ledger ─────────────────────────────────────────────────

    /// A user's trail progress with its full history, if created.
    pub fn trail_progress(&self, user_id: &str) -> Result<Option<TrailProgress>, DatabaseError> {
        let head = self
            .conn
            .query_row(
                "SELECT current_tile, steps_banked, total_steps_earned, created_at, updated_at
                 FROM trail_progress WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((current_tile, steps_banked, total_steps_earned, created_at, updated_at)) = head
        else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT day, steps_earned, steps_invested, productive_minutes, unproductive_minutes
             FROM trail_history WHERE user_id = ?1 ORDER BY day",
        )?;
        let history = stmt
            .query_map(params![user_id], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(TrailProgress {
            user_id: user_id.to_string(),
            current_tile,
            steps_banked,
            total_steps_earned,
            history,
            created_at: parse_ts(3, created_at)?,
            updated_at: parse_ts(4, updated_at)?,
        }))
    }

    /// Create the trail row for a user if it does not exist yet.
    pub fn init_trail(&self, user_id: &str, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO trail_progress
                 (user_id, current_tile, steps_banked, total_steps_earned, created_at, updated_at)
             VALUES (?1, 0, 0, 0, ?2, ?2)",
            params![user_id, now.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Write the trail head counters.
    pub fn update_trail(
        &self,
        user_id: &str,
        current_tile: u32,
        steps_banked: u32,
        total_steps_earned: u32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE trail_progress
             SET current_tile = ?2, steps_banked = ?3, total_steps_earned = ?4, updated_at = ?5
             WHERE user_id = ?1",
            params![
                user_id,
                current_tile,
                steps_banked,
                total_steps_earned,
                updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// The ledger entry for `(user, day)`, if present.
    pub fn history_entry(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Option<DailyTrailEntry>, DatabaseError> {
        let entry = self
            .conn
            .query_row(
                "SELECT day, steps_earned, steps_invested, productive_minutes, unproductive_minutes
                 FROM trail_history WHERE user_id = ?1 AND day = ?2",
                params![user_id, day.to_string()],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Insert or update the ledger entry for `(user, entry.date)` in place.
    /// Never produces a second row for the same day.
    pub fn upsert_history_entry(
        &self,
        user_id: &str,
        entry: &DailyTrailEntry,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO trail_history
                 (user_id, day, steps_earned, steps_invested, productive_minutes, unproductive_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, day) DO UPDATE SET
                 steps_earned = excluded.steps_earned,
                 steps_invested = excluded.steps_invested,
                 productive_minutes = excluded.productive_minutes,
                 unproductive_minutes = excluded.unproductive_minutes",
            params![
                user_id,
                entry.date.to_string(),
                entry.steps_earned,
                entry.steps_invested,
                entry.productive_minutes,
                entry.unproductive_minutes,
            ],
        )?;
        Ok(())
    }
}

const GOAL_COLUMNS: &str = "id, user_id, title, description, category, frequency, target_value, \
                            target_unit, metric, auto_track, deadline, total_target, is_active, \
                            current_streak, longest_streak, total_completions, \
                            last_credited_period, created_at";

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: GoalCategory::parse(&row.get::<_, String>(4)?),
        frequency: GoalFrequency::parse(&row.get::<_, String>(5)?),
        target_value: row.get(6)?,
        target_unit: row.get(7)?,
        metric: HealthMetric::parse(&row.get::<_, String>(8)?),
        auto_track: row.get(9)?,
        deadline: parse_opt_ts(10, row.get(10)?)?,
        total_target: row.get(11)?,
        is_active: row.get(12)?,
        current_streak: row.get(13)?,
        longest_streak: row.get(14)?,
        total_completions: row.get(15)?,
        last_credited_period: parse_opt_ts(16, row.get(16)?)?,
        created_at: parse_ts(17, row.get(17)?)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<GoalLog> {
    Ok(GoalLog {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        user_id: row.get(2)?,
        value: row.get(3)?,
        note: row.get(4)?,
        source: LogSource::parse(&row.get::<_, String>(5)?),
        logged_at: parse_ts(6, row.get(6)?)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<UsageEvent> {
    Ok(UsageEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        app_name: row.get(2)?,
        category: row.get(3)?,
        duration_minutes: row.get(4)?,
        is_productive: row.get(5)?,
        occurred_at: parse_ts(6, row.get(6)?)?,
        day: parse_day(7, row.get(7)?)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<DailyTrailEntry> {
    Ok(DailyTrailEntry {
        date: parse_day(0, row.get(0)?)?,
        steps_earned: row.get(1)?,
        steps_invested: row.get(2)?,
        productive_minutes: row.get(3)?,
        unproductive_minutes: row.get(4)?,
    })
}

fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_opt_ts(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_ts(idx, s)).transpose()
}

fn parse_day(idx: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
