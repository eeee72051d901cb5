//! Engine configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables of the lifecycle engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Age limit, in days, for analyses offered as a project basis
    pub recent_analysis_window_days: u32,
    /// Lifetime of a close ticket in seconds
    pub close_ticket_ttl_secs: u64,
    /// Title given to drafts with a blank title
    pub untitled_project_title: String,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With recent-analysis window
    #[inline]
    #[must_use]
    pub fn with_recent_analysis_window_days(mut self, days: u32) -> Self {
        self.recent_analysis_window_days = days;
        self
    }

    /// With close ticket lifetime
    #[inline]
    #[must_use]
    pub fn with_close_ticket_ttl_secs(mut self, secs: u64) -> Self {
        self.close_ticket_ttl_secs = secs;
        self
    }

    /// With fallback title
    #[inline]
    #[must_use]
    pub fn with_untitled_project_title(mut self, title: impl Into<String>) -> Self {
        self.untitled_project_title = title.into();
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Malformed TOML or an invalid value
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// I/O failure, malformed TOML or an invalid value
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_analysis_window_days == 0 {
            return Err(ConfigError::Invalid(
                "recent_analysis_window_days must be positive".into(),
            ));
        }
        if self.close_ticket_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "close_ticket_ttl_secs must be positive".into(),
            ));
        }
        if self.untitled_project_title.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "untitled_project_title must not be blank".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recent_analysis_window_days: 30,
            close_ticket_ttl_secs: 300,
            untitled_project_title: "Untitled Project".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("close_ticket_ttl_secs = 60").unwrap();
        assert_eq!(config.close_ticket_ttl_secs, 60);
        assert_eq!(config.recent_analysis_window_days, 30);
        assert_eq!(config.untitled_project_title, "Untitled Project");
    }

    #[test]
    fn rejects_zero_window() {
        let err = EngineConfig::from_toml_str("recent_analysis_window_days = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "untitled_project_title = \"Draft\"").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config, EngineConfig::new().with_untitled_project_title("Draft"));
    }
}
