//! Configuration

pub mod config;

pub use config::{ConfigError, ConfigurationManager, GameConfig, MapConfig, MonitorConfig, MovementConfig};
