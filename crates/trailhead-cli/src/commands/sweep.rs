//! Maintenance sweep commands for CLI.

use chrono::{Duration, NaiveDate, Utc};
use clap::Subcommand;
use trailhead_core::{reset_missed, rollup_all, Config, Database, StepEconomy, UsageClassifier};

#[derive(Subcommand)]
pub enum SweepAction {
    /// Zero streaks of daily goals that missed yesterday's target
    ResetMissed,
    /// Bank a day's steps for every user with activity
    Rollup {
        /// Calendar day (YYYY-MM-DD, default: yesterday)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run both nightly passes
    Nightly,
}

pub fn run(action: SweepAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SweepAction::ResetMissed => {
            let report = reset_missed(&db, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        SweepAction::Rollup { date } => {
            let config = Config::load()?;
            let classifier = UsageClassifier::from_config(&config);
            let economy = StepEconomy::with_config(&config.economy);
            let date = date.unwrap_or_else(|| Utc::now().date_naive() - Duration::days(1));
            let report = rollup_all(&db, &classifier, &economy, date)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        SweepAction::Nightly => {
            let config = Config::load()?;
            let classifier = UsageClassifier::from_config(&config);
            let economy = StepEconomy::with_config(&config.economy);
            let now = Utc::now();
            let streaks = reset_missed(&db, now)?;
            let rollup = rollup_all(&db, &classifier, &economy, now.date_naive() - Duration::days(1))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "streaks": streaks,
                    "rollup": rollup,
                }))?
            );
        }
    }
    Ok(())
}
