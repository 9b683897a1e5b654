//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [calendar]
//! timezone = "America/New_York"
//! session_open = "09:30"
//! safety_buffer_minutes = 2
//!
//! [split]
//! train_cutoff = "2024-06-28T13:28:00Z"
//!
//! [delayed_entry]
//! dip_fraction = 0.005
//! max_delay_hours = 6.0
//!
//! [run]
//! threads = 0
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use daybound_core::delayed_entry::{DelayedEntryConfig, DelayedEntryConfigError};
use daybound_core::{CalendarConfig, CalendarError, SessionCalendar, TrainCutoff};

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("calendar: {0}")]
    Calendar(#[from] CalendarError),
    #[error("delayed_entry: {0}")]
    DelayedEntry(#[from] DelayedEntryConfigError),
}

/// Train/out-of-sample split, in exit-boundary space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Rows whose exit boundary is at or before this instant are training rows.
    pub train_cutoff: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Worker threads for row evaluation; 0 uses the rayon default.
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub calendar: CalendarConfig,
    pub split: SplitConfig,
    #[serde(default)]
    pub delayed_entry: DelayedEntryConfig,
    #[serde(default)]
    pub run: RunSection,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        SessionCalendar::from_config(&self.calendar)?;
        self.delayed_entry.validate()?;
        Ok(())
    }

    pub fn session_calendar(&self) -> Result<SessionCalendar, ConfigError> {
        Ok(SessionCalendar::from_config(&self.calendar)?)
    }

    pub fn train_cutoff(&self) -> TrainCutoff {
        TrainCutoff::new(self.split.train_cutoff)
    }

    /// Deterministic hash of everything that affects results.
    ///
    /// `run.threads` is left out: output must not depend on it.
    pub fn run_id(&self) -> RunId {
        let semantic = (&self.calendar, &self.split, &self.delayed_entry);
        let json = serde_json::to_string(&semantic).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use daybound_core::path::GapPolicy;

    const FULL: &str = r#"
[calendar]
timezone = "Europe/London"
session_open = "08:00"
safety_buffer_minutes = 5
weekend = ["Sat", "Sun"]

[split]
train_cutoff = "2024-06-28T13:28:00Z"

[delayed_entry]
dip_fraction = 0.004
max_delay_hours = 3.0
take_profit_pct = 0.012
stop_loss_pct = 0.008
vol_tp_multiplier = 0.5
min_confidence = 0.6
confirmation_lookback_minutes = 30
gap_policy = "fill_at_open"

[run]
threads = 4
"#;

    #[test]
    fn parses_full_config() {
        let config = RunConfig::from_toml(FULL).unwrap();
        assert_eq!(config.calendar.timezone, "Europe/London");
        assert_eq!(config.calendar.safety_buffer_minutes, 5);
        assert_eq!(
            config.train_cutoff().instant(),
            Utc.with_ymd_and_hms(2024, 6, 28, 13, 28, 0).unwrap()
        );
        assert_eq!(config.delayed_entry.gap_policy, GapPolicy::FillAtOpen);
        assert_eq!(config.delayed_entry.confirmation_lookback_minutes, 30);
        assert_eq!(config.run.threads, 4);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config = RunConfig::from_toml("[split]\ntrain_cutoff = \"2024-01-01T00:00:00Z\"\n")
            .unwrap();
        assert_eq!(config.calendar, CalendarConfig::default());
        assert_eq!(config.delayed_entry, DelayedEntryConfig::default());
        assert_eq!(config.run.threads, 0);
    }

    #[test]
    fn cutoff_is_required() {
        assert!(matches!(RunConfig::from_toml("[run]\nthreads = 1\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_zone = FULL.replace("Europe/London", "Nowhere/Special");
        assert!(matches!(
            RunConfig::from_toml(&bad_zone),
            Err(ConfigError::Calendar(CalendarError::UnknownTimezone(_)))
        ));

        let bad_dip = FULL.replace("dip_fraction = 0.004", "dip_fraction = 1.5");
        assert!(matches!(
            RunConfig::from_toml(&bad_dip),
            Err(ConfigError::DelayedEntry(_))
        ));

        let endless_delay = FULL.replace("max_delay_hours = 3.0", "max_delay_hours = 1e15");
        assert!(matches!(
            RunConfig::from_toml(&endless_delay),
            Err(ConfigError::DelayedEntry(DelayedEntryConfigError::TooLarge { .. }))
        ));
    }

    #[test]
    fn run_id_ignores_thread_count() {
        let a = RunConfig::from_toml(FULL).unwrap();
        let mut b = a.clone();
        b.run.threads = 1;
        assert_eq!(a.run_id(), b.run_id());

        b.delayed_entry.dip_fraction = 0.006;
        assert_ne!(a.run_id(), b.run_id());
    }
}
