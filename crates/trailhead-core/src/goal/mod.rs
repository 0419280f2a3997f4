//! Goal tracking: models, period arithmetic, log ingestion, streaks.
//!
//! A goal is owned by exactly one user and accrues [`GoalLog`] entries.
//! Period totals (sum of log values inside the current daily/weekly/monthly
//! window) drive streak crediting; see [`streak`] for the evaluation rules.

pub mod ingest;
pub mod period;
pub mod streak;

pub use ingest::{record_log, LogOutcome, LogRequest};
pub use period::{period_bounds, period_start};
pub use streak::{evaluate, Evaluation};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How often a goal's target must be met for the streak to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl GoalFrequency {
    /// Parse a stored frequency string. Unrecognized values fall back to
    /// `Daily`; this is the documented default, not an error.
    pub fn parse(s: &str) -> Self {
        match s {
            "weekly" => GoalFrequency::Weekly,
            "monthly" => GoalFrequency::Monthly,
            _ => GoalFrequency::Daily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalFrequency::Daily => "daily",
            GoalFrequency::Weekly => "weekly",
            GoalFrequency::Monthly => "monthly",
        }
    }
}

/// Life area a goal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Academic,
    Fitness,
    Wellness,
    Sleep,
    Mindfulness,
    Nutrition,
    Screentime,
    Creative,
    Social,
    Career,
    Other,
}

impl GoalCategory {
    pub fn parse(s: &str) -> Self {
        match s {
            "academic" => GoalCategory::Academic,
            "fitness" => GoalCategory::Fitness,
            "wellness" => GoalCategory::Wellness,
            "sleep" => GoalCategory::Sleep,
            "mindfulness" => GoalCategory::Mindfulness,
            "nutrition" => GoalCategory::Nutrition,
            "screentime" => GoalCategory::Screentime,
            "creative" => GoalCategory::Creative,
            "social" => GoalCategory::Social,
            "career" => GoalCategory::Career,
            _ => GoalCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalCategory::Academic => "academic",
            GoalCategory::Fitness => "fitness",
            GoalCategory::Wellness => "wellness",
            GoalCategory::Sleep => "sleep",
            GoalCategory::Mindfulness => "mindfulness",
            GoalCategory::Nutrition => "nutrition",
            GoalCategory::Screentime => "screentime",
            GoalCategory::Creative => "creative",
            GoalCategory::Social => "social",
            GoalCategory::Career => "career",
            GoalCategory::Other => "other",
        }
    }
}

/// Device metrics a goal can track. `Manual` means the user logs progress
/// by hand; everything else can be synced from the device in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMetric {
    Steps,
    ActiveCalories,
    ExerciseMinutes,
    StandHours,
    DistanceWalkRun,
    FlightsClimbed,
    WorkoutCount,
    SleepDuration,
    MindfulMinutes,
    WaterIntake,
    RestingHeartRate,
    Hrv,
    Vo2max,
    Manual,
    Screentime,
}

impl HealthMetric {
    pub fn parse(s: &str) -> Self {
        match s {
            "steps" => HealthMetric::Steps,
            "active_calories" => HealthMetric::ActiveCalories,
            "exercise_minutes" => HealthMetric::ExerciseMinutes,
            "stand_hours" => HealthMetric::StandHours,
            "distance_walk_run" => HealthMetric::DistanceWalkRun,
            "flights_climbed" => HealthMetric::FlightsClimbed,
            "workout_count" => HealthMetric::WorkoutCount,
            "sleep_duration" => HealthMetric::SleepDuration,
            "mindful_minutes" => HealthMetric::MindfulMinutes,
            "water_intake" => HealthMetric::WaterIntake,
            "resting_heart_rate" => HealthMetric::RestingHeartRate,
            "hrv" => HealthMetric::Hrv,
            "vo2max" => HealthMetric::Vo2max,
            "screentime" => HealthMetric::Screentime,
            _ => HealthMetric::Manual,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthMetric::Steps => "steps",
            HealthMetric::ActiveCalories => "active_calories",
            HealthMetric::ExerciseMinutes => "exercise_minutes",
            HealthMetric::StandHours => "stand_hours",
            HealthMetric::DistanceWalkRun => "distance_walk_run",
            HealthMetric::FlightsClimbed => "flights_climbed",
            HealthMetric::WorkoutCount => "workout_count",
            HealthMetric::SleepDuration => "sleep_duration",
            HealthMetric::MindfulMinutes => "mindful_minutes",
            HealthMetric::WaterIntake => "water_intake",
            HealthMetric::RestingHeartRate => "resting_heart_rate",
            HealthMetric::Hrv => "hrv",
            HealthMetric::Vo2max => "vo2max",
            HealthMetric::Manual => "manual",
            HealthMetric::Screentime => "screentime",
        }
    }

    /// Canonical display unit for the metric.
    pub fn default_unit(&self) -> &'static str {
        match self {
            HealthMetric::Steps => "steps",
            HealthMetric::ActiveCalories => "kcal",
            HealthMetric::ExerciseMinutes => "min",
            HealthMetric::StandHours => "hrs",
            HealthMetric::DistanceWalkRun => "mi",
            HealthMetric::FlightsClimbed => "flights",
            HealthMetric::WorkoutCount => "workouts",
            HealthMetric::SleepDuration => "hrs",
            HealthMetric::MindfulMinutes => "min",
            HealthMetric::WaterIntake => "fl oz",
            HealthMetric::RestingHeartRate => "bpm",
            HealthMetric::Hrv => "ms",
            HealthMetric::Vo2max => "mL/kg/min",
            HealthMetric::Manual => "times",
            HealthMetric::Screentime => "min",
        }
    }

    /// Category implied by the metric, used when a goal is created with the
    /// category left as `Other`.
    pub fn default_category(&self) -> GoalCategory {
        match self {
            HealthMetric::Steps
            | HealthMetric::ActiveCalories
            | HealthMetric::ExerciseMinutes
            | HealthMetric::StandHours
            | HealthMetric::DistanceWalkRun
            | HealthMetric::FlightsClimbed
            | HealthMetric::WorkoutCount => GoalCategory::Fitness,
            HealthMetric::SleepDuration => GoalCategory::Sleep,
            HealthMetric::MindfulMinutes => GoalCategory::Mindfulness,
            HealthMetric::WaterIntake => GoalCategory::Nutrition,
            HealthMetric::Screentime => GoalCategory::Screentime,
            HealthMetric::RestingHeartRate | HealthMetric::Hrv | HealthMetric::Vo2max => {
                GoalCategory::Wellness
            }
            HealthMetric::Manual => GoalCategory::Other,
        }
    }

    /// Whether this metric structurally cannot be entered by hand.
    ///
    /// Sleep duration only exists as a device reading; a manual log for it
    /// is rejected with [`CoreError::InvalidSource`]. This is a per-metric
    /// domain rule, not generic validation.
    ///
    /// [`CoreError::InvalidSource`]: crate::error::CoreError::InvalidSource
    pub fn device_only(&self) -> bool {
        matches!(self, HealthMetric::SleepDuration)
    }
}

/// Where a goal log came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    /// Entered by hand.
    Manual,
    /// Synced from the device (cumulative daily totals; see the replacing
    /// write mode in [`ingest::record_log`]).
    Device,
    /// Derived from screen-time monitoring.
    Screentime,
}

impl LogSource {
    pub fn parse(s: &str) -> Self {
        match s {
            "device" | "healthkit" => LogSource::Device,
            "screentime" => LogSource::Screentime,
            _ => LogSource::Manual,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Manual => "manual",
            LogSource::Device => "device",
            LogSource::Screentime => "screentime",
        }
    }
}

/// A tracked goal with its streak state.
///
/// Invariant: `longest_streak >= current_streak` after every update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    pub frequency: GoalFrequency,
    pub target_value: f64,
    pub target_unit: String,
    pub metric: HealthMetric,
    /// When set, device syncs replace the day's device log instead of
    /// accumulating (device totals are already cumulative for the day).
    pub auto_track: bool,
    pub deadline: Option<DateTime<Utc>>,
    /// Cumulative target for time-bounded goals ("run 50 miles this month").
    pub total_target: Option<f64>,
    pub is_active: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    /// Period start of the last streak credit. Guards against crediting the
    /// same period twice when evaluation runs repeatedly.
    pub last_credited_period: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: GoalCategory,
    pub frequency: GoalFrequency,
    pub target_value: f64,
    pub target_unit: String,
    pub metric: HealthMetric,
    #[serde(default)]
    pub auto_track: bool,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_target: Option<f64>,
}

impl NewGoal {
    /// A manual, daily, once-per-day goal. Callers override fields as needed.
    pub fn manual(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            category: GoalCategory::Other,
            frequency: GoalFrequency::Daily,
            target_value: 1.0,
            target_unit: "times".to_string(),
            metric: HealthMetric::Manual,
            auto_track: false,
            deadline: None,
            total_target: None,
        }
    }

    /// Fill in the unit and category from the metric when the caller left
    /// them at their defaults.
    pub fn with_metric_defaults(mut self) -> Self {
        if self.metric != HealthMetric::Manual && self.target_unit == "times" {
            self.target_unit = self.metric.default_unit().to_string();
        }
        if self.category == GoalCategory::Other {
            self.category = self.metric.default_category();
        }
        self
    }
}

/// A single progress observation against a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalLog {
    pub id: String,
    pub goal_id: String,
    pub user_id: String,
    pub value: f64,
    pub note: Option<String>,
    pub source: LogSource,
    pub logged_at: DateTime<Utc>,
}
