use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::plan::EndpointPlans;

/// Report service connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Scheme and host, e.g. `http://localhost:3000`
    pub base_url: String,
    /// Prepended to every plan path (default: `/api`)
    pub api_prefix: String,
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// A 404 on the final delete attempt counts as already deleted
    pub treat_delete_not_found_as_success: bool,
    pub plans: EndpointPlans,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_prefix: "/api".to_string(),
            timeout_secs: 30,
            treat_delete_not_found_as_success: true,
            plans: EndpointPlans::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// # Errors
    /// Returns [`ClientError::InvalidBaseUrl`] unless `base_url` is an
    /// absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ClientError> {
        let invalid = |message: String| ClientError::InvalidBaseUrl {
            url: self.base_url.clone(),
            message,
        };
        let parsed =
            url::Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(invalid(format!("unsupported scheme `{other}`"))),
        }
    }

    /// Absolute URL for a rendered plan path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        let prefix = self.api_prefix.trim_matches('/');
        let base = self.base_url.trim_end_matches('/');
        if prefix.is_empty() {
            format!("{base}{path}")
        } else {
            format!("{base}/{prefix}{path}")
        }
    }
}
