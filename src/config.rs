use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_CURRENCY_DECIMALS: u32 = 2;
const DEFAULT_MAX_REASON_LENGTH: u64 = 500;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;
const CONFIG_DIR: &str = "config";

/// Refund engine configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RefundConfig {
    /// Decimal places the active currency displays with. Arithmetic is
    /// always full precision; this only affects formatting.
    #[serde(default = "default_currency_decimals")]
    #[validate(range(max = 8))]
    pub currency_decimals: u32,

    /// Longest refund reason accepted from callers.
    #[serde(default = "default_max_reason_length")]
    #[validate(range(min = 1, max = 5000))]
    pub max_reason_length: u64,

    /// Whether refund notes are visible to the customer.
    #[serde(default)]
    pub customer_visible_notes: bool,

    /// Capacity of the engine event channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Log filter used when RUST_LOG is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_currency_decimals() -> u32 {
    DEFAULT_CURRENCY_DECIMALS
}

fn default_max_reason_length() -> u64 {
    DEFAULT_MAX_REASON_LENGTH
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for RefundConfig {
    fn default() -> Self {
        Self {
            currency_decimals: default_currency_decimals(),
            max_reason_length: default_max_reason_length(),
            customer_visible_notes: false,
            event_channel_capacity: default_event_channel_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl RefundConfig {
    /// Loads configuration from `config/default`, an environment-specific
    /// file selected by `RUN_ENV`, and `REFUND_`-prefixed environment
    /// variables, in that order of precedence.
    pub fn load() -> Result<Self, ConfigError> {
        let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let config: RefundConfig = Config::builder()
            .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
            .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
            .add_source(Environment::with_prefix("REFUND").separator("__"))
            .build()?
            .try_deserialize()?;

        config
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid configuration: {}", e)))?;

        Ok(config)
    }
}
