//! Remote classification model client.
//!
//! The last-resort branch of the classifier. The request carries a bounded
//! timeout so a slow or absent model can never stall log processing; every
//! failure mode surfaces as [`CoreError::ExternalUnavailable`] and is
//! absorbed by [`UsageClassifier`](super::UsageClassifier) into the neutral
//! default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Classification;
use crate::error::CoreError;

/// External classification function: `(app_name, context) -> classification
/// or unavailable`. Implementations must be cheap to drop and safe to call
/// from any thread.
pub trait RemoteClassifier: Send + Sync {
    fn classify(&self, app_name: &str, context: Option<&str>) -> Result<Classification, CoreError>;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    app_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    category: String,
    is_productive: bool,
    waste_score: f64,
}

/// HTTP client for an external classification model.
pub struct HttpClassifier {
    endpoint: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl HttpClassifier {
    /// Build a client for `endpoint` with a per-request `timeout`.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            endpoint,
            timeout,
            client,
        }
    }
}

impl RemoteClassifier for HttpClassifier {
    fn classify(&self, app_name: &str, context: Option<&str>) -> Result<Classification, CoreError> {
        // The request carries its own deadline so the bound holds even if
        // the builder fell back to a default client.
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&ClassifyRequest { app_name, context })
            .send()
            .map_err(|e| CoreError::ExternalUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::ExternalUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let body: ClassifyResponse = response
            .json()
            .map_err(|e| CoreError::ExternalUnavailable(e.to_string()))?;

        Ok(Classification {
            category: body.category,
            is_productive: body.is_productive,
            waste_score: body.waste_score,
        })
    }
}
