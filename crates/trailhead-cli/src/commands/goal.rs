//! Goal management commands for CLI.

use chrono::{Duration, NaiveDate, Utc};
use clap::Subcommand;
use trailhead_core::goal::{period, LogRequest};
use trailhead_core::{Database, GoalCategory, GoalFrequency, HealthMetric, LogSource, NewGoal};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a new goal
    Create {
        /// Goal title
        title: String,
        /// Goal description
        #[arg(long)]
        description: Option<String>,
        /// Life area: academic, fitness, wellness, sleep, ... (default: from metric)
        #[arg(long)]
        category: Option<String>,
        /// Cadence: daily, weekly, monthly (default: daily)
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// Target value per period (default: 1)
        #[arg(long, default_value = "1")]
        target: f64,
        /// Target unit (default: from metric)
        #[arg(long)]
        unit: Option<String>,
        /// Tracked metric: steps, sleep_duration, manual, ... (default: manual)
        #[arg(long, default_value = "manual")]
        metric: String,
        /// Replace the day's device log on sync instead of accumulating
        #[arg(long)]
        auto_track: bool,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Log progress against a goal
    Log {
        /// Goal ID
        goal_id: String,
        /// Observed value
        value: f64,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
        /// Log source: manual, device, screentime (default: manual)
        #[arg(long, default_value = "manual")]
        source: String,
        /// Calendar day (YYYY-MM-DD) the value belongs to (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// List active goals
    List {
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Show one goal with its streak state
    Show {
        /// Goal ID
        goal_id: String,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Deactivate a goal (its logs stay queryable)
    Deactivate {
        /// Goal ID
        goal_id: String,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Recent logs for a goal
    History {
        /// Goal ID
        goal_id: String,
        /// How many days back to include (default: 30)
        #[arg(long, default_value = "30")]
        days: i64,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        GoalAction::Create {
            title,
            description,
            category,
            frequency,
            target,
            unit,
            metric,
            auto_track,
            user,
        } => {
            let metric = HealthMetric::parse(&metric);
            let new = NewGoal {
                description,
                category: category
                    .as_deref()
                    .map(GoalCategory::parse)
                    .unwrap_or(GoalCategory::Other),
                frequency: GoalFrequency::parse(&frequency),
                target_value: target,
                target_unit: unit.unwrap_or_else(|| "times".to_string()),
                metric,
                auto_track,
                ..NewGoal::manual(&title)
            };
            let goal = db.create_goal(&user, new, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&goal)?);
        }
        GoalAction::Log {
            goal_id,
            value,
            note,
            source,
            date,
            user,
        } => {
            let request = LogRequest {
                note,
                date,
                ..LogRequest::new(&goal_id, value, LogSource::parse(&source))
            };
            let outcome = trailhead_core::record_log(&db, &user, request, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        GoalAction::List { user } => {
            let goals = db.active_goals(&user)?;
            println!("{}", serde_json::to_string_pretty(&goals)?);
        }
        GoalAction::Show { goal_id, user } => match db.find_goal(&goal_id, &user)? {
            Some(goal) => println!("{}", serde_json::to_string_pretty(&goal)?),
            None => {
                eprintln!("goal not found: {goal_id}");
                std::process::exit(1);
            }
        },
        GoalAction::Deactivate { goal_id, user } => {
            if db.deactivate_goal(&goal_id, &user)? {
                println!("deactivated {goal_id}");
            } else {
                eprintln!("goal not found: {goal_id}");
                std::process::exit(1);
            }
        }
        GoalAction::History { goal_id, days, user } => {
            // Scoped lookup first so another user's goal id leaks nothing
            if db.find_goal(&goal_id, &user)?.is_none() {
                eprintln!("goal not found: {goal_id}");
                std::process::exit(1);
            }
            let since = period::midnight(Utc::now().date_naive()) - Duration::days(days);
            let logs = db.logs_for_goal_since(&goal_id, since)?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
    }
    Ok(())
}
