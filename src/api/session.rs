//! Frame-driven session wiring the positioning components together
//!
//! The host owns the render loop: it forwards pointer clicks, calls
//! [`PositioningSession::update`] once per frame and decides when to run
//! position tests. The session keeps the ordering contract that the tracker
//! advances before its position is projected for drawing.

use crate::algorithms::calibration::CalibrationEngine;
use crate::algorithms::projection::GeoProjector;
use crate::api::formatting::CalibrationReport;
use crate::core::{GeoPoint, PixelPoint, ProjectionOrigin};
use crate::processing::tracker::{MovementTiming, PlayerPositionTracker};
use crate::utils::config::{ConfigurationManager, GameConfig};
use crate::validation::accuracy::{PositionAccuracyMonitor, PositionTestRecord};
use crate::validation::boundary::{BoundaryPolicy, TerritoryRegistry};
use crate::validation::error::GeoResult;
use tracing::{debug, info};

/// Minimal view of the player position handed to collaborators such as
/// monsters or network sync, so they never touch the tracker directly.
pub trait PositionSource {
    fn player_position(&self) -> GeoPoint;

    /// Ask the player to walk to `target`; false when the move is refused
    fn request_move(&mut self, target: GeoPoint, now_ms: f64) -> bool;
}

impl PositionSource for PlayerPositionTracker {
    fn player_position(&self) -> GeoPoint {
        self.current()
    }

    fn request_move(&mut self, target: GeoPoint, now_ms: f64) -> bool {
        self.set_target(target, now_ms)
    }
}

/// One player's positioning state for a running game
#[derive(Debug)]
pub struct PositioningSession {
    config: GameConfig,
    origin: ProjectionOrigin,
    tracker: PlayerPositionTracker,
    calibration: CalibrationEngine,
    monitor: PositionAccuracyMonitor,
    territories: TerritoryRegistry,
    last_sample_ms: Option<u64>,
}

impl PositioningSession {
    /// Build a session from a validated configuration
    pub fn new(config: GameConfig) -> GeoResult<Self> {
        let validation = ConfigurationManager::validate_config(&config);
        if let Some(err) = validation.errors.into_iter().next() {
            return Err(err.into());
        }

        let origin = ProjectionOrigin::from_zoom(config.origin, config.map.zoom, config.map.screen_center)?;
        let policy = BoundaryPolicy::new(config.origin, config.boundary_radius_m, config.territory_radius_m);
        let timing = MovementTiming {
            ms_per_meter: config.movement.ms_per_meter,
            max_duration_ms: config.movement.max_duration_ms,
        };

        info!(
            origin = %config.origin,
            zoom = config.map.zoom,
            meters_per_pixel = origin.meters_per_pixel,
            "Positioning session started"
        );

        Ok(Self {
            origin,
            tracker: PlayerPositionTracker::with_timing(policy, timing),
            calibration: CalibrationEngine::new(origin),
            monitor: PositionAccuracyMonitor::with_capacity(config.monitor.history_capacity),
            territories: TerritoryRegistry::new(policy),
            last_sample_ms: None,
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn origin(&self) -> &ProjectionOrigin {
        &self.origin
    }

    pub fn tracker(&self) -> &PlayerPositionTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut PlayerPositionTracker {
        &mut self.tracker
    }

    pub fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    pub fn monitor(&self) -> &PositionAccuracyMonitor {
        &self.monitor
    }

    /// Geographic position under a container pixel, using current calibration
    pub fn pixel_to_geo(&self, pixel: &PixelPoint) -> GeoResult<GeoPoint> {
        GeoProjector::to_geo(pixel, &self.origin, &self.calibration.parameters())
    }

    /// Container pixel for a geographic position, using current calibration
    pub fn geo_to_pixel(&self, geo: &GeoPoint) -> GeoResult<PixelPoint> {
        GeoProjector::to_pixel(geo, &self.origin, &self.calibration.parameters())
    }

    /// Translate a click into a move request
    pub fn handle_click(&mut self, pixel: PixelPoint, now_ms: f64) -> GeoResult<GeoPoint> {
        let target = self.pixel_to_geo(&pixel)?;
        self.tracker.try_set_target(target, now_ms)?;
        Ok(target)
    }

    /// Advance one frame and return where to draw the player
    pub fn update(&mut self, now_ms: f64) -> GeoResult<PixelPoint> {
        self.tracker.advance(now_ms);
        self.player_pixel()
    }

    /// Where the player sprite currently belongs on screen
    pub fn player_pixel(&self) -> GeoResult<PixelPoint> {
        self.geo_to_pixel(&self.tracker.current())
    }

    /// Change zoom; calibration samples are carried into the new pixel scale
    pub fn set_zoom(&mut self, zoom: f64) -> GeoResult<()> {
        self.origin = ProjectionOrigin::from_zoom(self.origin.center, zoom, self.origin.screen_center)?;
        self.config.map.zoom = zoom;
        self.calibration.set_origin(self.origin);
        debug!(zoom, meters_per_pixel = self.origin.meters_per_pixel, "Map zoom changed");
        Ok(())
    }

    /// Recenter the map view. The play area stays anchored on the configured
    /// origin and calibration samples follow the view.
    pub fn recenter(&mut self, center: GeoPoint) -> GeoResult<()> {
        self.origin = ProjectionOrigin::from_zoom(center, self.config.map.zoom, self.origin.screen_center)?;
        self.calibration.set_origin(self.origin);
        debug!(center = %center, "Map recentered");
        Ok(())
    }

    /// True once per configured sampling interval
    pub fn should_sample(&mut self, now_ms: u64) -> bool {
        let due = match self.last_sample_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.config.monitor.sample_interval_ms,
            None => true,
        };
        if due {
            self.last_sample_ms = Some(now_ms);
        }
        due
    }

    /// Compare the displayed player position against a reference position
    pub fn run_position_test(&mut self, expected: GeoPoint, timestamp_ms: u64) -> GeoResult<PositionTestRecord> {
        expected.validate()?;
        let player_pixel = self.player_pixel()?;
        let calculated = self.pixel_to_geo(&player_pixel)?;
        let record = self.monitor.record_sample(timestamp_ms, player_pixel, calculated, expected);

        if self.config.monitor.auto_calibrate && record.distance_m > self.config.monitor.auto_calibrate_threshold_m {
            debug!(distance_m = record.distance_m, "Feeding position test into calibration");
            self.calibration.add_sample(player_pixel, expected);
        }

        Ok(record)
    }

    /// Record that `pixel` should represent `expected`
    pub fn add_calibration_point(&mut self, pixel: PixelPoint, expected: GeoPoint) -> GeoResult<()> {
        expected.validate()?;
        self.calibration.add_sample(pixel, expected);
        Ok(())
    }

    pub fn reset_calibration(&mut self) {
        self.calibration.remove_all_samples();
    }

    /// Plant a flag, subject to the boundary and territory rules
    pub fn place_flag(&mut self, geo: GeoPoint) -> GeoResult<()> {
        self.territories.try_place(geo)
    }

    pub fn flags(&self) -> &[GeoPoint] {
        self.territories.flags()
    }

    pub fn territories_mut(&mut self) -> &mut TerritoryRegistry {
        &mut self.territories
    }

    pub fn report(&self) -> CalibrationReport {
        CalibrationReport::new(
            self.monitor.statistics(),
            self.calibration.parameters(),
            self.calibration.status(),
            self.calibration.sample_count(),
        )
    }
}

impl PositionSource for PositioningSession {
    fn player_position(&self) -> GeoPoint {
        self.tracker.current()
    }

    fn request_move(&mut self, target: GeoPoint, now_ms: f64) -> bool {
        self.tracker.set_target(target, now_ms)
    }
}
