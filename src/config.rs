use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{DeskError, Result};

/// desk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeskConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub limits: LoanLimits,
}

/// how money is rendered in tables and cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

/// bounds on the terms an operator may approve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLimits {
    #[serde(default = "default_max_installments")]
    pub max_installments: u32,
    /// monthly rate ceiling, in percent
    #[serde(default = "default_max_interest_rate")]
    pub max_interest_rate: Decimal,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

fn default_thousands_separator() -> String {
    ",".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

fn default_max_installments() -> u32 {
    60
}

fn default_max_interest_rate() -> Decimal {
    dec!(100)
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            decimal_separator: default_decimal_separator(),
            thousands_separator: default_thousands_separator(),
            decimal_places: default_decimal_places(),
        }
    }
}

impl DisplayConfig {
    /// brazilian real: `R$ 1.234,56`
    pub fn brazil() -> Self {
        Self {
            currency_symbol: "R$".to_string(),
            decimal_separator: ",".to_string(),
            thousands_separator: ".".to_string(),
            decimal_places: 2,
        }
    }
}

impl Default for LoanLimits {
    fn default() -> Self {
        Self {
            max_installments: default_max_installments(),
            max_interest_rate: default_max_interest_rate(),
        }
    }
}

impl DeskConfig {
    /// configuration for a brazilian deployment
    pub fn brazil() -> Self {
        Self {
            display: DisplayConfig::brazil(),
            limits: LoanLimits::default(),
        }
    }

    /// parse from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| DeskError::InvalidConfiguration {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// parse from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// load from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DeskError::InvalidConfiguration {
            message: format!("{}: {}", path, e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.limits.max_installments == 0 {
            return Err(DeskError::InvalidConfiguration {
                message: "max_installments must be at least 1".to_string(),
            });
        }
        if self.limits.max_interest_rate < Decimal::ZERO {
            return Err(DeskError::InvalidConfiguration {
                message: "max_interest_rate must not be negative".to_string(),
            });
        }
        if self.display.decimal_separator == self.display.thousands_separator {
            return Err(DeskError::InvalidConfiguration {
                message: "decimal and thousands separators must differ".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeskConfig::default();
        assert_eq!(config.limits.max_installments, 60);
        assert_eq!(config.limits.max_interest_rate, dec!(100));
        assert_eq!(config.display.decimal_places, 2);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = DeskConfig::from_toml_str(
            r#"
            [display]
            currency_symbol = "R$"
            decimal_separator = ","
            thousands_separator = "."

            [limits]
            max_installments = 24
            "#,
        )
        .unwrap();

        assert_eq!(config.display, DisplayConfig::brazil());
        assert_eq!(config.limits.max_installments, 24);
        assert_eq!(config.limits.max_interest_rate, dec!(100));
    }

    #[test]
    fn test_empty_documents_are_default() {
        assert_eq!(DeskConfig::from_toml_str("").unwrap(), DeskConfig::default());
        assert_eq!(DeskConfig::from_json_str("{}").unwrap(), DeskConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = DeskConfig::from_toml_str("[limits]\nmax_installments = 0\n").unwrap_err();
        assert!(matches!(err, DeskError::InvalidConfiguration { .. }));

        let err = DeskConfig::from_json_str(
            r#"{"display": {"decimal_separator": ",", "thousands_separator": ","}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DeskError::InvalidConfiguration { .. }));
    }
}
