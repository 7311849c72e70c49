//! YAML configuration for the `daybook` CLI

use std::path::Path;

use daybook_client::ClientConfig;
use daybook_core::ViewConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaybookConfig {
    pub client: ClientConfig,
    pub view: ViewConfig,
}

impl DaybookConfig {
    /// Parse a YAML config file from a path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(content.as_str())
    }

    /// Parse a YAML config from a string
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: DaybookConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides, then re-validate.
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        report_type: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(base_url) = base_url {
            self.client.base_url = base_url;
        }
        if let Some(report_type) = report_type {
            self.view.report_type = report_type;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Err(err) = self.client.validate() {
            return Err(ConfigError::Validation(err.to_string()));
        }
        if self.view.date_fields.is_empty() {
            return Err(ConfigError::Validation(
                "At least one date field must be listed".into(),
            ));
        }
        if self.view.items_field.trim().is_empty() {
            return Err(ConfigError::Validation(
                "items_field cannot be empty".into(),
            ));
        }
        if let Some(group) = &self.view.group {
            if group.key_field.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "group.key_field cannot be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Report type is only required once every override has been applied.
    pub fn require_report_type(&self) -> Result<&str, ConfigError> {
        match self.view.report_type.trim() {
            "" => Err(ConfigError::Validation(
                "No report type configured; set view.report_type or pass --type".into(),
            )),
            report_type => Ok(report_type),
        }
    }
}
