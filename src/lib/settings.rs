//! Settings for balance computation and report rendering.
//!
//! Values are layered: built-in defaults, then an optional TOML file
//! (`settle_up.toml` unless another path is given), then `SETTLE_UP_*`
//! environment variables.
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::optimizer::DEFAULT_EPSILON;

/// Largest scale a `Decimal` can represent.
const MAX_SCALE: u32 = 28;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Decimal places of the currency's minor unit.
    pub scale: u32,
    pub epsilon: Decimal,
    pub prune_zero_balances: bool,
    pub output_format: OutputFormat,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scale: 2,
            epsilon: DEFAULT_EPSILON,
            prune_zero_balances: false,
            output_format: OutputFormat::Csv,
            log_level: String::from("info"),
        }
    }
}

impl Settings {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .set_default("scale", 2)?
            .set_default("epsilon", "0.01")?
            .set_default("prune_zero_balances", false)?
            .set_default("output_format", "csv")?
            .set_default("log_level", "info")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("SETTLE_UP"))
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scale > MAX_SCALE {
            return Err(Error::invalid(format!(
                "scale {} exceeds the maximum of {}",
                self.scale, MAX_SCALE
            )));
        }
        if self.epsilon <= Decimal::ZERO {
            return Err(Error::invalid(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{OutputFormat, Settings};
    use crate::error::Error;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::from_file("does/not/exist/settle_up").unwrap();

        assert_eq!(settings.scale, 2);
        assert_eq!(settings.epsilon, Decimal::new(1, 2));
        assert!(!settings.prune_zero_balances);
        assert_eq!(settings.output_format, OutputFormat::Csv);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn non_positive_epsilon_is_rejected() {
        for epsilon in [Decimal::ZERO, Decimal::new(-1, 2)] {
            let settings = Settings {
                epsilon,
                ..Settings::default()
            };
            assert!(matches!(settings.validate(), Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn scale_beyond_decimal_precision_is_rejected() {
        let settings = Settings {
            scale: 29,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidInput(_))));
    }
}
