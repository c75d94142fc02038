use crate::errors::ConfigError;
use log::info;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Named durations that drive the reveal timeline.
///
/// Every delay the renderer plays is derived from these values; nothing in
/// the pipeline hardcodes a timing inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealConfig {
    /// Pause before the first list entry appears.
    pub initial_delay: Duration,
    /// Gap between two consecutive list entries.
    pub stagger_interval: Duration,
    /// How long a vote bar takes to fill.
    pub bar_fill_duration: Duration,
    pub badge_delay: Duration,
    pub bar_delay: Duration,
    pub trophy_delay: Duration,
    pub count_up_duration: Duration,
    pub celebration_frame_interval: Duration,
    pub celebration_frames: u32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            stagger_interval: Duration::from_millis(400),
            bar_fill_duration: Duration::from_millis(1500),
            badge_delay: Duration::from_millis(200),
            bar_delay: Duration::from_millis(300),
            trophy_delay: Duration::from_millis(500),
            count_up_duration: Duration::from_millis(2000),
            celebration_frame_interval: Duration::from_millis(1200),
            celebration_frames: 4,
        }
    }
}

impl RevealConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            initial_delay: millis("REVEAL_INITIAL_DELAY_MS", defaults.initial_delay)?,
            stagger_interval: millis("REVEAL_STAGGER_MS", defaults.stagger_interval)?,
            bar_fill_duration: millis("REVEAL_BAR_FILL_MS", defaults.bar_fill_duration)?,
            badge_delay: millis("REVEAL_BADGE_DELAY_MS", defaults.badge_delay)?,
            bar_delay: millis("REVEAL_BAR_DELAY_MS", defaults.bar_delay)?,
            trophy_delay: millis("REVEAL_TROPHY_DELAY_MS", defaults.trophy_delay)?,
            count_up_duration: millis("REVEAL_COUNT_UP_MS", defaults.count_up_duration)?,
            celebration_frame_interval: millis(
                "REVEAL_CELEBRATION_FRAME_MS",
                defaults.celebration_frame_interval,
            )?,
            celebration_frames: parse_var("REVEAL_CELEBRATION_FRAMES", defaults.celebration_frames)?,
        })
    }
}

pub struct AppConfig {
    pub discord_token: String,
    pub database_url: String,
    pub reveal: RevealConfig,
    pub session_idle_timeout: Duration,
    pub reaper_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let discord_token = env::var("DISCORD_TOKEN").map_err(|_| ConfigError::Missing("DISCORD_TOKEN"))?;

        // Get database URL from environment or use a default
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:podium_reveal.db".to_string());

        Ok(Self {
            discord_token,
            database_url,
            reveal: RevealConfig::from_env()?,
            session_idle_timeout: Duration::from_secs(parse_var("REVEAL_SESSION_IDLE_SECS", 900u64)?),
            reaper_interval: Duration::from_secs(parse_var("REVEAL_REAPER_INTERVAL_SECS", 60u64)?),
        })
    }
}

// Longest single reveal timing accepted from the environment: one hour
const MAX_TIMING_MS: u64 = 60 * 60 * 1000;

fn millis(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    let value = parse_var(key, default_ms)?;
    if value > MAX_TIMING_MS {
        return Err(ConfigError::Invalid { key, value: value.to_string() });
    }
    Ok(Duration::from_millis(value))
}

fn parse_var<T: FromStr + std::fmt::Display>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => {
            let parsed = raw.trim().parse::<T>();
            parsed.map_err(|_| ConfigError::Invalid { key, value: raw })
        }
        Err(_) => {
            info!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings_match_reveal_constants() {
        let config = RevealConfig::default();
        assert_eq!(config.initial_delay, Duration::from_millis(500));
        assert_eq!(config.stagger_interval, Duration::from_millis(400));
        assert_eq!(config.bar_fill_duration, Duration::from_millis(1500));
        assert_eq!(config.celebration_frames, 4);
    }

    #[test]
    fn rejects_malformed_numbers() {
        // Unique key so parallel tests never race on it
        unsafe { env::set_var("REVEAL_TEST_BAD_VALUE_MS", "soon") };
        let result = millis("REVEAL_TEST_BAD_VALUE_MS", Duration::from_millis(1));
        unsafe { env::remove_var("REVEAL_TEST_BAD_VALUE_MS") };
        assert!(matches!(result, Err(ConfigError::Invalid { key: "REVEAL_TEST_BAD_VALUE_MS", .. })));
    }

    #[test]
    fn rejects_timings_beyond_an_hour() {
        unsafe { env::set_var("REVEAL_TEST_HUGE_MS", "18446744073709551615") };
        let result = millis("REVEAL_TEST_HUGE_MS", Duration::from_millis(1));
        unsafe { env::remove_var("REVEAL_TEST_HUGE_MS") };
        assert!(matches!(result, Err(ConfigError::Invalid { key: "REVEAL_TEST_HUGE_MS", .. })));
    }

    #[test]
    fn missing_variable_falls_back_to_default() {
        let value = millis("REVEAL_TEST_UNSET_MS", Duration::from_millis(750)).unwrap();
        assert_eq!(value, Duration::from_millis(750));
    }
}
