//! TOML configuration. Every section is optional; command-line flags win
//! over file values.

use crate::clock::{is_iso_date, Clock};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Upper bound for `profile.calendar_days`.
pub const MAX_CALENDAR_DAYS: u32 = 366;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub clock: ClockConfig,
    pub logging: LoggingConfig,
    pub leaderboard: LeaderboardConfig,
    pub profile: ProfileConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed ISO date; unset means the device-local date.
    pub today: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "batchbookd=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub podium_size: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self { podium_size: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub calendar_days: u32,
    pub chart_points: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            calendar_days: 30,
            chart_points: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub progress_tests: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { progress_tests: 5 }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        Self::parse(&text)
            .with_context(|| format!("invalid config {}", path.to_string_lossy()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(d) = &self.clock.today {
            if !is_iso_date(d) {
                return Err(anyhow!("clock.today must be YYYY-MM-DD, got {:?}", d));
            }
        }
        if self.profile.calendar_days > MAX_CALENDAR_DAYS {
            return Err(anyhow!(
                "profile.calendar_days must be at most {}, got {}",
                MAX_CALENDAR_DAYS,
                self.profile.calendar_days
            ));
        }
        Ok(())
    }

    pub fn clock(&self) -> Clock {
        match &self.clock.today {
            Some(d) => Clock::Fixed(d.clone()),
            None => Clock::System,
        }
    }
}
