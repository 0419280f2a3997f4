//! App usage commands for CLI.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use trailhead_core::usage::aggregate;
use trailhead_core::{Config, Database, UsageClassifier};

#[derive(Subcommand)]
pub enum UsageAction {
    /// Record an app usage interval
    Record {
        /// App name or bundle id
        app_name: String,
        /// Interval length in minutes
        minutes: f64,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Daily productive/wasted summary with per-app breakdown
    Summary {
        /// Calendar day (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Classify an app name without recording anything
    Classify {
        /// App name or bundle id
        app_name: String,
    },
}

pub fn run(action: UsageAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let classifier = UsageClassifier::from_config(&config);

    match action {
        UsageAction::Record {
            app_name,
            minutes,
            user,
        } => {
            if !minutes.is_finite() || minutes <= 0.0 {
                eprintln!("minutes must be a positive number, got {minutes}");
                std::process::exit(1);
            }
            let db = Database::open()?;
            let classification = classifier.classify(&app_name);
            let event = db.record_usage_event(
                &user,
                &app_name,
                &classification.category,
                minutes,
                classification.is_productive,
                Utc::now(),
            )?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        UsageAction::Summary { date, user } => {
            let db = Database::open()?;
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let events = db.usage_events_for_day(&user, date)?;
            let summary = aggregate(&classifier, date, &events);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        UsageAction::Classify { app_name } => {
            let classification = classifier.classify(&app_name);
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
    }
    Ok(())
}
