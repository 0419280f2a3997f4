//! Step economy commands for CLI.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use trailhead_core::{Config, Database, StepEconomy, UsageClassifier};

#[derive(Subcommand)]
pub enum StepsAction {
    /// Compute a day's earned steps without banking them
    Calculate {
        /// Calendar day (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Bank a day's earned steps (safe to re-run)
    Apply {
        /// Calendar day (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Invest banked steps into the trail
    Invest {
        /// Steps to invest
        amount: u32,
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Show trail position, banked balance, and daily history
    Trail {
        /// User id
        #[arg(long, default_value = "local")]
        user: String,
    },
}

pub fn run(action: StepsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let classifier = UsageClassifier::from_config(&config);
    let economy = StepEconomy::with_config(&config.economy);

    match action {
        StepsAction::Calculate { date, user } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let steps = economy.calculate_daily_steps(&db, &classifier, &user, date)?;
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }
        StepsAction::Apply { date, user } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let progress = economy.apply_daily_calculation(&db, &classifier, &user, date)?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        StepsAction::Invest { amount, user } => {
            let progress = economy.invest_steps(&db, &classifier, &user, amount, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        StepsAction::Trail { user } => match economy.trail_progress(&db, &user)? {
            Some(progress) => println!("{}", serde_json::to_string_pretty(&progress)?),
            None => {
                eprintln!("no trail yet for user: {user}");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
