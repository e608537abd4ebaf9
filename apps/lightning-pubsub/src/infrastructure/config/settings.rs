//! Monitor Configuration Settings
//!
//! Configuration types for the event aggregator, loaded from environment
//! variables.

use std::str::FromStr;
use std::time::Duration;

/// Event pipeline settings.
#[derive(Debug, Clone)]
pub struct PubSubSettings {
    /// Capacity of each per-subscription record queue.
    pub record_queue_capacity: usize,
    /// Capacity of the outbound event channel.
    pub event_buffer: usize,
}

impl Default for PubSubSettings {
    fn default() -> Self {
        Self {
            record_queue_capacity: 64,
            event_buffer: 1_024,
        }
    }
}

/// Periodic state ticker settings.
#[derive(Debug, Clone)]
pub struct TickerSettings {
    /// Polling interval.
    pub interval: Duration,
    /// Poll node info (blocks, peers, channel counts).
    pub info: bool,
    /// Poll the aggregate channel balance.
    pub channels_balance: bool,
    /// Poll the on-chain wallet balance.
    pub wallet_balance: bool,
}

impl Default for TickerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            info: true,
            channels_balance: true,
            // The transaction subscription already reports wallet activity.
            wallet_balance: false,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone, Default)]
pub struct ServerSettings {
    /// Prometheus metrics port (0 = disabled).
    pub metrics_port: u16,
}

/// Simulated node settings.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    /// Average delay between simulated records on each subscription.
    pub record_interval: Duration,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            record_interval: Duration::from_secs(1),
        }
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Event pipeline settings.
    pub pubsub: PubSubSettings,
    /// Ticker settings.
    pub ticker: TickerSettings,
    /// Server port settings.
    pub server: ServerSettings,
    /// Simulated node settings.
    pub simulation: SimulationSettings,
}

impl MonitorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable or zero value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is unparsable or zero where zero is not
    /// allowed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pubsub_defaults = PubSubSettings::default();
        let pubsub = PubSubSettings {
            record_queue_capacity: non_zero(
                "PUBSUB_RECORD_QUEUE_CAPACITY",
                parse_value(
                    &lookup,
                    "PUBSUB_RECORD_QUEUE_CAPACITY",
                    pubsub_defaults.record_queue_capacity,
                )?,
            )?,
            event_buffer: non_zero(
                "PUBSUB_EVENT_BUFFER",
                parse_value(&lookup, "PUBSUB_EVENT_BUFFER", pubsub_defaults.event_buffer)?,
            )?,
        };

        let ticker_defaults = TickerSettings::default();
        let ticker = TickerSettings {
            interval: parse_duration_millis(
                &lookup,
                "PUBSUB_TICKER_INTERVAL_MS",
                ticker_defaults.interval,
            )?,
            info: parse_flag(&lookup, "PUBSUB_TICKER_INFO", ticker_defaults.info)?,
            channels_balance: parse_flag(
                &lookup,
                "PUBSUB_TICKER_CHANNELS_BALANCE",
                ticker_defaults.channels_balance,
            )?,
            wallet_balance: parse_flag(
                &lookup,
                "PUBSUB_TICKER_WALLET_BALANCE",
                ticker_defaults.wallet_balance,
            )?,
        };

        let server = ServerSettings {
            metrics_port: parse_value(
                &lookup,
                "PUBSUB_METRICS_PORT",
                ServerSettings::default().metrics_port,
            )?,
        };

        let simulation = SimulationSettings {
            record_interval: parse_duration_millis(
                &lookup,
                "PUBSUB_SIMULATED_INTERVAL_MS",
                SimulationSettings::default().record_interval,
            )?,
        };

        Ok(Self {
            pubsub,
            ticker,
            server,
            simulation,
        })
    }
}

/// Configuration error.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable could not be parsed.
    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value found.
        value: String,
    },
    /// Environment variable must be greater than zero.
    #[error("environment variable {0} must be greater than zero")]
    Zero(String),
}

fn parse_value<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn parse_duration_millis<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let default_millis = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    let millis = non_zero(key, parse_value(lookup, key, default_millis)?)?;
    Ok(Duration::from_millis(millis))
}

fn non_zero<T>(key: &str, value: T) -> Result<T, ConfigError>
where
    T: PartialEq + Default,
{
    if value == T::default() {
        Err(ConfigError::Zero(key.to_string()))
    } else {
        Ok(value)
    }
}
