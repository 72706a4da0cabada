//! # Configuration State
//!
//! Display settings for the terminal, loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`KHATA_*`)
//! 2. Defaults (this file)
//!
//! Backend settings (URL, timeouts, retries) live in
//! [`khata_client::ClientConfig`], which also reads `khata.toml`.
//!
//! ## Thread Safety
//! Read-only after initialization, so no lock.

use khata_core::Money;
use serde::{Deserialize, Serialize};

/// Terminal display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (shown in the console banner)
    pub store_name: String,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,
}

impl Default for ConfigState {
    /// Development defaults: "Khata POS Dev Store", INR (₹), 2 decimals.
    fn default() -> Self {
        ConfigState {
            store_name: "Khata POS Dev Store".to_string(),
            currency_code: "INR".to_string(),
            currency_symbol: "₹".to_string(),
            currency_decimals: 2,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `KHATA_STORE_NAME`: Override store name
    /// - `KHATA_CURRENCY_SYMBOL`: Override currency symbol
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConfigState::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConfigState::default();

        if let Some(store_name) = lookup("KHATA_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(symbol) = lookup("KHATA_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        config
    }

    /// Formats an amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_paise(1234)), "₹12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let minor = amount.paise();
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = minor / divisor;
        let frac = (minor % divisor).abs();

        format!(
            "{}{}{}",
            if minor < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_positive() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_paise(1234)), "₹12.34");
        assert_eq!(config.format_currency(Money::from_paise(100)), "₹1.00");
        assert_eq!(config.format_currency(Money::from_paise(1)), "₹0.01");
        assert_eq!(config.format_currency(Money::zero()), "₹0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_paise(-1234)), "-₹12.34");
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigState::from_lookup(|key| match key {
            "KHATA_STORE_NAME" => Some("Sharma General Store".to_string()),
            "KHATA_CURRENCY_SYMBOL" => Some("Rs ".to_string()),
            _ => None,
        });

        assert_eq!(config.store_name, "Sharma General Store");
        assert_eq!(config.format_currency(Money::from_rupees(350)), "Rs 350.00");
    }
}
