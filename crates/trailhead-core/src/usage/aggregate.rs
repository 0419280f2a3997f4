//! Daily usage aggregation.
//!
//! Folds one user's usage events for a calendar date through the
//! classifier, producing productive/wasted totals and a per-app breakdown.
//! Pure over its inputs; the caller supplies the events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{UsageClassifier, UsageEvent};

/// Aggregated usage for one app on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUsage {
    pub app_name: String,
    pub category: String,
    pub is_productive: bool,
    pub waste_score: f64,
    pub minutes: f64,
    pub wasted_minutes: f64,
    pub productive_minutes: f64,
}

/// One user's usage totals for a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUsageSummary {
    pub date: NaiveDate,
    pub total_minutes: f64,
    pub productive_minutes: f64,
    pub unproductive_minutes: f64,
    pub breakdown: Vec<AppUsage>,
}

impl DailyUsageSummary {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_minutes: 0.0,
            productive_minutes: 0.0,
            unproductive_minutes: 0.0,
            breakdown: Vec::new(),
        }
    }
}

/// Fold a day's events into totals. Events not dated `date` are skipped;
/// a date with no events yields zeroed totals, not an error.
pub fn aggregate(
    classifier: &UsageClassifier,
    date: NaiveDate,
    events: &[UsageEvent],
) -> DailyUsageSummary {
    let mut summary = DailyUsageSummary::empty(date);

    for event in events.iter().filter(|e| e.day == date) {
        let assessment = classifier.assess(&event.app_name, event.duration_minutes, event.occurred_at);

        summary.total_minutes += event.duration_minutes;
        summary.productive_minutes += assessment.productive_minutes;
        summary.unproductive_minutes += assessment.wasted_minutes;

        match summary
            .breakdown
            .iter_mut()
            .find(|a| a.app_name == event.app_name)
        {
            Some(entry) => {
                entry.minutes += event.duration_minutes;
                entry.wasted_minutes += assessment.wasted_minutes;
                entry.productive_minutes += assessment.productive_minutes;
            }
            None => summary.breakdown.push(AppUsage {
                app_name: event.app_name.clone(),
                category: assessment.classification.category.clone(),
                is_productive: assessment.classification.is_productive,
                waste_score: assessment.classification.waste_score,
                minutes: event.duration_minutes,
                wasted_minutes: assessment.wasted_minutes,
                productive_minutes: assessment.productive_minutes,
            }),
        }
    }

    summary
}
