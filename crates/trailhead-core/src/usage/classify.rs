//! App classification and waste scoring.
//!
//! Resolution order for an app name:
//! 1. exact case-insensitive match against the static known-apps table
//! 2. substring match in either direction against the same table
//! 3. the optional remote model, with a bounded timeout
//!
//! Classification never fails: if the remote model is unavailable or
//! errors, the neutral default (`unknown`, not productive, waste 0.5) is
//! returned and the failure is logged. Callers never see the error.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::remote::RemoteClassifier;
use crate::storage::Config;

/// Productivity verdict for an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub is_productive: bool,
    /// 0.0 (fully productive) to 1.0 (fully wasteful).
    pub waste_score: f64,
}

impl Classification {
    /// Neutral default for apps nothing could classify.
    pub fn unknown() -> Self {
        Self {
            category: "unknown".to_string(),
            is_productive: false,
            waste_score: 0.5,
        }
    }

    /// Force the score into `[0,1]`; non-finite values fall back to neutral.
    fn clamped(mut self) -> Self {
        if !self.waste_score.is_finite() {
            self.waste_score = 0.5;
        }
        self.waste_score = self.waste_score.clamp(0.0, 1.0);
        self
    }
}

/// A classified usage interval with both derived time figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageAssessment {
    pub classification: Classification,
    pub time_factor: f64,
    pub duration_minutes: f64,
    pub wasted_minutes: f64,
    pub productive_minutes: f64,
}

struct KnownApp {
    name: &'static str,
    category: &'static str,
    is_productive: bool,
    waste_score: f64,
}

const fn app(name: &'static str, category: &'static str, is_productive: bool, waste_score: f64) -> KnownApp {
    KnownApp {
        name,
        category,
        is_productive,
        waste_score,
    }
}

/// Static classification table, keyed by normalized app name.
const KNOWN_APPS: &[KnownApp] = &[
    // Social media (high waste)
    app("instagram", "social_media", false, 0.9),
    app("facebook", "social_media", false, 0.85),
    app("tiktok", "social_media", false, 0.95),
    app("twitter", "social_media", false, 0.8),
    app("x", "social_media", false, 0.8),
    app("snapchat", "social_media", false, 0.9),
    app("reddit", "social_media", false, 0.75),
    // Entertainment (medium-high waste)
    app("youtube", "entertainment", false, 0.7),
    app("netflix", "entertainment", false, 0.85),
    app("spotify", "entertainment", false, 0.4),
    app("twitch", "entertainment", false, 0.8),
    // Productivity (low waste)
    app("gmail", "productivity", true, 0.2),
    app("outlook", "productivity", true, 0.2),
    app("calendar", "productivity", true, 0.1),
    app("notes", "productivity", true, 0.15),
    app("notion", "productivity", true, 0.2),
    app("todoist", "productivity", true, 0.15),
    app("trello", "productivity", true, 0.2),
    app("slack", "productivity", true, 0.3),
    app("teams", "productivity", true, 0.3),
    // Education (low waste)
    app("coursera", "education", true, 0.2),
    app("khan academy", "education", true, 0.2),
    app("duolingo", "education", true, 0.25),
    // Games (high waste)
    app("games", "gaming", false, 0.9),
    app("candy crush", "gaming", false, 0.9),
    app("among us", "gaming", false, 0.85),
];

fn normalize(app_name: &str) -> String {
    app_name.trim().to_lowercase()
}

/// Time-of-day multiplier applied to the wasted-minutes figure.
///
/// Work hours and late night amplify waste; mornings dampen it. The
/// multiplier scales the derived figure only, never the stored score.
pub fn time_factor(hour: u32) -> f64 {
    match hour {
        9..=16 => 1.2,
        23 | 0 | 1 => 1.3,
        6..=8 => 0.8,
        _ => 1.0,
    }
}

/// Classifies app usage against the static table with an optional remote
/// model fallback.
pub struct UsageClassifier {
    remote: Option<Box<dyn RemoteClassifier>>,
}

impl UsageClassifier {
    /// Table-only classifier (no remote fallback).
    pub fn new() -> Self {
        Self { remote: None }
    }

    /// Classifier with a remote model as the last-resort branch.
    pub fn with_remote(remote: Box<dyn RemoteClassifier>) -> Self {
        Self {
            remote: Some(remote),
        }
    }

    /// Build from configuration: attaches the HTTP classifier when an
    /// endpoint is configured.
    pub fn from_config(config: &Config) -> Self {
        match &config.classifier.remote_endpoint {
            Some(endpoint) => Self::with_remote(Box::new(super::HttpClassifier::new(
                endpoint.clone(),
                std::time::Duration::from_secs(config.classifier.remote_timeout_secs),
            ))),
            None => Self::new(),
        }
    }

    /// Classify an app. Always returns a classification.
    pub fn classify(&self, app_name: &str) -> Classification {
        let normalized = normalize(app_name);

        if let Some(known) = KNOWN_APPS.iter().find(|k| k.name == normalized) {
            return known.into();
        }

        // Substring match either direction, e.g. "com.instagram.app"
        // contains "instagram".
        if let Some(known) = KNOWN_APPS
            .iter()
            .find(|k| normalized.contains(k.name) || k.name.contains(normalized.as_str()))
        {
            return known.into();
        }

        if let Some(remote) = &self.remote {
            match remote.classify(app_name, None) {
                Ok(classification) => return classification.clamped(),
                Err(e) => {
                    tracing::warn!(app = app_name, error = %e,
                        "remote classification failed, using neutral default");
                }
            }
        }

        Classification::unknown()
    }

    /// Classify an interval and derive its wasted and productive minutes.
    ///
    /// The two figures are intentionally asymmetric: wasted minutes are
    /// scaled by the time-of-day factor and capped at the actual duration,
    /// productive minutes use the raw score only.
    pub fn assess(
        &self,
        app_name: &str,
        duration_minutes: f64,
        at: DateTime<Utc>,
    ) -> UsageAssessment {
        let classification = self.classify(app_name);
        let factor = time_factor(at.hour());
        let wasted = (duration_minutes * classification.waste_score * factor).min(duration_minutes);
        let productive = duration_minutes * (1.0 - classification.waste_score);
        UsageAssessment {
            classification,
            time_factor: factor,
            duration_minutes,
            wasted_minutes: wasted,
            productive_minutes: productive,
        }
    }
}

impl Default for UsageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&KnownApp> for Classification {
    fn from(known: &KnownApp) -> Self {
        Classification {
            category: known.category.to_string(),
            is_productive: known.is_productive,
            waste_score: known.waste_score,
        }
    }
}
