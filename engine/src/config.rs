//! Simulation configuration supplied by the front end.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Grid dimensions, step period and random seeding density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rows: usize,
    pub cols: usize,
    /// Delay between automatic steps, in milliseconds.
    pub tick_interval_ms: u64,
    /// Percent chance (0..=100) that a cell starts alive when randomizing.
    pub seed_density_percent: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 15,
            cols: 15,
            tick_interval_ms: 300,
            seed_density_percent: 25,
        }
    }
}

impl Config {
    /// Reject zero dimensions or interval and densities above 100.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 {
            return Err(invalid("rows must be at least 1"));
        }
        if self.cols == 0 {
            return Err(invalid("cols must be at least 1"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick interval must be at least 1 ms"));
        }
        if self.seed_density_percent > 100 {
            return Err(invalid(format!(
                "seed density must be within 0..=100, got {}",
                self.seed_density_percent
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(text).map_err(|err| invalid(format!("malformed config: {err}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(reason: impl Into<String>) -> EngineError {
    EngineError::InvalidConfiguration(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_millis(300));
    }

    #[test]
    fn zero_values_are_rejected() {
        let zero_rows = Config { rows: 0, ..Config::default() };
        let zero_cols = Config { cols: 0, ..Config::default() };
        let zero_tick = Config {
            tick_interval_ms: 0,
            ..Config::default()
        };
        for config in [zero_rows, zero_cols, zero_tick] {
            assert!(matches!(config.validate(), Err(EngineError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn density_bounds() {
        let full = Config {
            seed_density_percent: 100,
            ..Config::default()
        };
        let over = Config {
            seed_density_percent: 101,
            ..Config::default()
        };
        assert!(full.validate().is_ok());
        let err = over.validate().unwrap_err();
        assert!(err.to_string().contains("101"), "missing value in: {err}");
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = Config::from_json(r#"{"rows": 40, "tick_interval_ms": 50}"#).unwrap();
        assert_eq!(config.rows, 40);
        assert_eq!(config.cols, 15);
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.seed_density_percent, 25);
    }

    #[test]
    fn json_is_validated() {
        assert!(Config::from_json(r#"{"cols": 0}"#).is_err());
        assert!(Config::from_json("not json").is_err());
    }
}
