//! Configuration commands for CLI.

use clap::Subcommand;
use trailhead_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "economy.steps_per_goal")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match get(&config, &key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            set(&mut config, &key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

fn get(config: &Config, key: &str) -> Option<String> {
    match key {
        "economy.steps_per_goal" => Some(config.economy.steps_per_goal.to_string()),
        "economy.minutes_per_step" => Some(config.economy.minutes_per_step.to_string()),
        "classifier.remote_endpoint" => Some(
            config
                .classifier
                .remote_endpoint
                .clone()
                .unwrap_or_else(|| "(unset)".to_string()),
        ),
        "classifier.remote_timeout_secs" => Some(config.classifier.remote_timeout_secs.to_string()),
        _ => None,
    }
}

fn set(config: &mut Config, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    match key {
        "economy.steps_per_goal" => config.economy.steps_per_goal = value.parse()?,
        "economy.minutes_per_step" => config.economy.minutes_per_step = value.parse()?,
        "classifier.remote_endpoint" => {
            config.classifier.remote_endpoint = if value.is_empty() || value == "unset" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "classifier.remote_timeout_secs" => config.classifier.remote_timeout_secs = value.parse()?,
        _ => {
            eprintln!("unknown key: {key}");
            std::process::exit(1);
        }
    }
    Ok(())
}
