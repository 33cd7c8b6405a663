//! # Application Configuration
//!
//! Configuration loaded once at startup and shared by every domain API.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`BOOKHAVEN_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bookhaven_core::{Money, RentalPolicy};

// =============================================================================
// Latency Simulation
// =============================================================================

/// Simulated service latency.
///
/// The original services this engine mocks ran behind a network, so every
/// operation carries an artificial delay to keep the UI honest about
/// loading states. Tests run with [`Latency::none`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Latency {
    enabled: bool,
}

impl Latency {
    /// Latency simulation on: operations sleep their nominal duration.
    pub const fn simulated() -> Self {
        Latency { enabled: true }
    }

    /// Latency simulation off (tests).
    pub const fn none() -> Self {
        Latency { enabled: false }
    }

    /// Checks whether delays are applied.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sleeps for `ms` milliseconds when simulation is enabled.
    ///
    /// There is no cancellation path: a caller that abandons the future
    /// before completion has simply stopped listening, the operation
    /// itself still runs to completion wherever it is awaited.
    pub async fn pause(&self, ms: u64) {
        if self.enabled {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Latency::simulated()
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Application configuration.
///
/// ## Fields
/// Most fields have sensible defaults for development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the snapshot and session files.
    pub data_dir: PathBuf,

    /// Simulated service latency.
    pub latency: Latency,

    /// Rental deposit / late-fee policy.
    pub rental_policy: RentalPolicy,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,
}

impl Default for AppConfig {
    /// Returns default configuration suitable for development.
    ///
    /// ## Default Values
    /// - Data dir: `./data`
    /// - Latency: simulated
    /// - Rental policy: 2× weekly deposit, $1.00/day late fee
    /// - Currency: USD ($)
    fn default() -> Self {
        AppConfig {
            data_dir: PathBuf::from("./data"),
            latency: Latency::simulated(),
            rental_policy: RentalPolicy::default(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
        }
    }
}

impl AppConfig {
    /// Creates an AppConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `BOOKHAVEN_DATA_DIR`: Override the data directory
    /// - `BOOKHAVEN_LATENCY`: `off` disables simulated latency
    /// - `BOOKHAVEN_LATE_FEE_CENTS`: Override the per-day late fee
    pub fn from_env() -> Self {
        let mut config = AppConfig::default();

        if let Ok(dir) = std::env::var("BOOKHAVEN_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(latency) = std::env::var("BOOKHAVEN_LATENCY") {
            if latency.eq_ignore_ascii_case("off") {
                config.latency = Latency::none();
            }
        }

        if let Ok(fee_str) = std::env::var("BOOKHAVEN_LATE_FEE_CENTS") {
            if let Ok(cents) = fee_str.parse::<i64>() {
                config.rental_policy = config.rental_policy.late_fee_cents_per_day(cents);
            }
        }

        config
    }

    /// Formats a money amount as a currency string.
    ///
    /// This is the one place cents become a display string. Stored totals
    /// are always plain cents; locale and symbol live here.
    ///
    /// ## Example
    /// ```rust
    /// use bookhaven_api::AppConfig;
    /// use bookhaven_core::Money;
    ///
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
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

// =============================================================================
// Unit Tests
// =============================================================================
