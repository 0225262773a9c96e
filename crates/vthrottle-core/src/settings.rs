//! Throttle settings and validation.
//!
//! Pure configuration types; hosts load them from wherever they keep
//! configuration (serde covers JSON/TOML/etc).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default minimum interval between publishes.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Upper bound accepted by [`validate_settings`] (one day).
pub const MAX_DELAY_MS: i64 = 86_400_000;

/// Convert a signed millisecond delay into a [`Duration`].
///
/// Negative delays are treated as zero, i.e. "publish every input immediately".
pub fn delay_from_millis(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

/// Throttle configuration.
///
/// All fields are optional so partial configuration falls back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThrottleSettings {
    /// Minimum interval between publishes, in milliseconds. Negative values
    /// are treated as zero.
    pub delay_ms: Option<i64>,

    /// Whether a host session ignores inputs equal to the previous input.
    pub skip_unchanged: Option<bool>,
}

impl ThrottleSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            delay_ms: Some(DEFAULT_DELAY_MS as i64),
            skip_unchanged: Some(true),
        }
    }

    /// Settings with a fixed delay and defaults for everything else.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay_ms: Some(i64::try_from(delay.as_millis()).unwrap_or(i64::MAX)),
            ..Self::with_defaults()
        }
    }

    /// Get the effective delay (with default fallback, negatives clamped).
    #[must_use]
    pub fn effective_delay(&self) -> Duration {
        self.delay_ms
            .map_or(Duration::from_millis(DEFAULT_DELAY_MS), delay_from_millis)
    }

    #[must_use]
    pub fn effective_skip_unchanged(&self) -> bool {
        self.skip_unchanged.unwrap_or(true)
    }

    /// Merge an update into these settings, only touching fields that are Some.
    pub fn merge(&mut self, other: &ThrottleSettingsUpdate) {
        if let Some(delay) = other.delay_ms {
            self.delay_ms = delay;
        }
        if let Some(skip) = other.skip_unchanged {
            self.skip_unchanged = skip;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThrottleSettingsUpdate {
    pub delay_ms: Option<Option<i64>>,
    pub skip_unchanged: Option<Option<bool>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Throttle delay must be at most {MAX_DELAY_MS} ms, got {0}")]
    DelayTooLong(i64),
}

/// Validate settings.
///
/// Negative delays are accepted; they mean "no throttling".
pub fn validate_settings(settings: &ThrottleSettings) -> Result<(), SettingsError> {
    if let Some(delay) = settings.delay_ms {
        if delay > MAX_DELAY_MS {
            return Err(SettingsError::DelayTooLong(delay));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ThrottleSettings::with_defaults();
        assert_eq!(settings.effective_delay(), Duration::from_millis(1000));
        assert!(settings.effective_skip_unchanged());

        let empty = ThrottleSettings::default();
        assert_eq!(empty.effective_delay(), Duration::from_millis(DEFAULT_DELAY_MS));
    }

    #[test]
    fn test_negative_delay_is_zero() {
        assert_eq!(delay_from_millis(-250), Duration::ZERO);
        let settings = ThrottleSettings {
            delay_ms: Some(-1),
            ..Default::default()
        };
        assert_eq!(settings.effective_delay(), Duration::ZERO);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_validate_rejects_huge_delay() {
        let settings = ThrottleSettings {
            delay_ms: Some(MAX_DELAY_MS + 1),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::DelayTooLong(MAX_DELAY_MS + 1))
        );
    }

    #[test]
    fn test_merge_partial_update() {
        let mut settings = ThrottleSettings::with_defaults();
        settings.merge(&ThrottleSettingsUpdate {
            delay_ms: Some(Some(250)),
            skip_unchanged: None,
        });
        assert_eq!(settings.effective_delay(), Duration::from_millis(250));
        assert_eq!(settings.skip_unchanged, Some(true));

        settings.merge(&ThrottleSettingsUpdate {
            delay_ms: Some(None),
            skip_unchanged: Some(Some(false)),
        });
        assert_eq!(settings.delay_ms, None);
        assert!(!settings.effective_skip_unchanged());
    }

    #[test]
    fn test_settings_from_json_uses_defaults() {
        let settings: ThrottleSettings = serde_json::from_str(r#"{"delay_ms": 300}"#).unwrap();
        assert_eq!(settings.effective_delay(), Duration::from_millis(300));
        assert_eq!(settings.skip_unchanged, None);
    }
}
