//! Configuration Module
//!
//! Configuration loading for the monitor binary.

mod settings;

pub use settings::{
    ConfigError, MonitorConfig, PubSubSettings, ServerSettings, SimulationSettings,
    TickerSettings,
};
