use crate::core::{
    GeoPoint, PixelPoint, DEFAULT_BOUNDARY_RADIUS_M, DEFAULT_TERRITORY_RADIUS_M, DEFAULT_ZOOM,
    MAX_MOVE_DURATION_MS, MOVE_MS_PER_METER, POSITION_HISTORY_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Highest zoom level served by common slippy-map tile sources
const MAX_ZOOM: f64 = 22.0;

/// Game-wide positioning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Center of the play area and the player's spawn point
    pub origin: GeoPoint,
    /// Maximum distance from the origin a player may move (meters)
    pub boundary_radius_m: f64,
    /// Minimum spacing between placed flags (meters)
    pub territory_radius_m: f64,
    /// Map view settings
    pub map: MapConfig,
    /// Movement timing
    pub movement: MovementConfig,
    /// Position accuracy monitoring
    pub monitor: MonitorConfig,
    /// Enable debug logging
    pub debug_logging: bool,
}

/// Map view configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Web-Mercator zoom level
    pub zoom: f64,
    /// Container pixel the origin is drawn at
    pub screen_center: PixelPoint,
}

/// Movement timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Move duration per meter travelled (milliseconds)
    pub ms_per_meter: f64,
    /// Cap on a single move's duration (milliseconds)
    pub max_duration_ms: f64,
}

/// Accuracy monitor configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Number of position tests retained
    pub history_capacity: usize,
    /// Interval between periodic position tests (milliseconds)
    pub sample_interval_ms: u64,
    /// Feed large errors back into calibration automatically
    pub auto_calibrate: bool,
    /// Error above which a test becomes a calibration sample (meters)
    pub auto_calibrate_threshold_m: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            origin: GeoPoint::default(),
            boundary_radius_m: DEFAULT_BOUNDARY_RADIUS_M,
            territory_radius_m: DEFAULT_TERRITORY_RADIUS_M,
            map: MapConfig::default(),
            movement: MovementConfig::default(),
            monitor: MonitorConfig::default(),
            debug_logging: false,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            screen_center: PixelPoint::new(400.0, 300.0),
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            ms_per_meter: MOVE_MS_PER_METER,
            max_duration_ms: MAX_MOVE_DURATION_MS,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: POSITION_HISTORY_CAPACITY,
            sample_interval_ms: 1000,
            auto_calibrate: false,
            auto_calibrate_threshold_m: 5.0,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    IoError { message: String },
    /// JSON serialization/deserialization error
    SerializationError { message: String },
}

/// Outcome of validating a configuration
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn into_first_error(self) -> Option<ConfigError> {
        self.errors.into_iter().next()
    }
}

/// Owns the active configuration and its backing file
#[derive(Debug, Clone, Default)]
pub struct ConfigurationManager {
    config: GameConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Replace the whole configuration after validation
    pub fn update_config(&mut self, config: GameConfig) -> Result<(), ConfigError> {
        let validation = Self::validate_config(&config);
        if let Some(err) = validation.into_first_error() {
            return Err(err);
        }

        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: GameConfig = serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        let validation = Self::validate_config(&config);
        for warning in &validation.warnings {
            warn!("{}: {}", path_str, warning);
        }
        if let Some(err) = validation.into_first_error() {
            return Err(err);
        }

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        info!("Configuration loaded from {}", self.config_file_path.as_deref().unwrap_or_default());
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        info!("Configuration saved to {}", path_str);
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Set the play radius, returning the previous value
    pub fn set_boundary_radius(&mut self, radius_m: f64) -> Result<f64, ConfigError> {
        let candidate = GameConfig {
            boundary_radius_m: radius_m,
            ..self.config.clone()
        };
        self.apply(candidate).map(|old| old.boundary_radius_m)
    }

    /// Set the map zoom, returning the previous value
    pub fn set_zoom(&mut self, zoom: f64) -> Result<f64, ConfigError> {
        let mut candidate = self.config.clone();
        candidate.map.zoom = zoom;
        self.apply(candidate).map(|old| old.map.zoom)
    }

    /// Move the play area, returning the previous origin
    pub fn set_origin(&mut self, origin: GeoPoint) -> Result<GeoPoint, ConfigError> {
        let candidate = GameConfig {
            origin,
            ..self.config.clone()
        };
        self.apply(candidate).map(|old| old.origin)
    }

    fn apply(&mut self, candidate: GameConfig) -> Result<GameConfig, ConfigError> {
        let old = self.config.clone();
        self.update_config(candidate)?;
        Ok(old)
    }

    /// Validate a configuration
    pub fn validate_config(config: &GameConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Err(e) = config.origin.validate() {
            errors.push(ConfigError::InvalidParameter {
                parameter: "origin".to_string(),
                value: config.origin.to_string(),
                reason: e.to_string(),
            });
        } else if config.origin.latitude.abs() > 85.0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "origin.latitude".to_string(),
                value: config.origin.latitude.to_string(),
                reason: "Web-Mercator maps do not extend beyond 85 degrees".to_string(),
            });
        }

        for (parameter, value) in [
            ("boundary_radius_m", config.boundary_radius_m),
            ("territory_radius_m", config.territory_radius_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                errors.push(ConfigError::InvalidParameter {
                    parameter: parameter.to_string(),
                    value: value.to_string(),
                    reason: "Radius must be positive and finite".to_string(),
                });
            }
        }

        if config.territory_radius_m >= config.boundary_radius_m {
            warnings.push("Territory radius is not smaller than the play radius; only one flag will fit".to_string());
        }

        if !config.map.zoom.is_finite() || !(0.0..=MAX_ZOOM).contains(&config.map.zoom) {
            errors.push(ConfigError::InvalidParameter {
                parameter: "map.zoom".to_string(),
                value: config.map.zoom.to_string(),
                reason: format!("Zoom must be between 0 and {}", MAX_ZOOM),
            });
        }

        if !config.map.screen_center.is_finite() {
            errors.push(ConfigError::InvalidParameter {
                parameter: "map.screen_center".to_string(),
                value: config.map.screen_center.to_string(),
                reason: "Screen center must be finite".to_string(),
            });
        }

        for (parameter, value) in [
            ("movement.ms_per_meter", config.movement.ms_per_meter),
            ("movement.max_duration_ms", config.movement.max_duration_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::InvalidParameter {
                    parameter: parameter.to_string(),
                    value: value.to_string(),
                    reason: "Movement timing must be non-negative and finite".to_string(),
                });
            }
        }

        if config.monitor.history_capacity == 0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "monitor.history_capacity".to_string(),
                value: "0".to_string(),
                reason: "History must hold at least one record".to_string(),
            });
        }

        if config.monitor.sample_interval_ms < 100 {
            warnings.push("Sampling more often than every 100 ms adds little information".to_string());
        }

        if !config.monitor.auto_calibrate_threshold_m.is_finite() || config.monitor.auto_calibrate_threshold_m < 0.0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "monitor.auto_calibrate_threshold_m".to_string(),
                value: config.monitor.auto_calibrate_threshold_m.to_string(),
                reason: "Threshold must be non-negative and finite".to_string(),
            });
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => {
                write!(f, "Invalid parameter '{}' = '{}': {}", parameter, value, reason)
            }
            ConfigError::IoError { message } => {
                write!(f, "I/O error: {}", message)
            }
            ConfigError::SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
