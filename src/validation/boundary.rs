//! Play-area boundary and flag territory rules

use crate::algorithms::geodesy::haversine_distance_m;
use crate::core::GeoPoint;
use crate::validation::error::{GeoError, GeoResult, ViolationKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Circular play area around an origin, plus the flag exclusion radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPolicy {
    pub origin: GeoPoint,
    pub radius_m: f64,
    pub territory_radius_m: f64,
}

impl BoundaryPolicy {
    pub fn new(origin: GeoPoint, radius_m: f64, territory_radius_m: f64) -> Self {
        Self {
            origin,
            radius_m,
            territory_radius_m,
        }
    }

    /// True iff `point` lies within `radius_m` of `origin` (great-circle)
    pub fn is_within_boundary(point: &GeoPoint, origin: &GeoPoint, radius_m: f64) -> bool {
        haversine_distance_m(point, origin) <= radius_m
    }

    /// True iff `point` is at least `territory_radius_m` from every existing point
    pub fn is_within_territory(point: &GeoPoint, existing: &[GeoPoint], territory_radius_m: f64) -> bool {
        existing
            .iter()
            .all(|other| haversine_distance_m(point, other) >= territory_radius_m)
    }

    /// Instance form of [`BoundaryPolicy::is_within_boundary`]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        Self::is_within_boundary(point, &self.origin, self.radius_m)
    }

    /// Reject points outside the play area with the measured distance
    pub fn check_boundary(&self, point: &GeoPoint) -> GeoResult<()> {
        point.validate()?;
        let distance_m = haversine_distance_m(point, &self.origin);
        if distance_m <= self.radius_m {
            Ok(())
        } else {
            Err(GeoError::BoundaryViolation {
                distance_m,
                limit_m: self.radius_m,
                kind: ViolationKind::OutsideBoundary,
            })
        }
    }

    /// Reject points inside another flag's territory
    pub fn check_territory(&self, point: &GeoPoint, existing: &[GeoPoint]) -> GeoResult<()> {
        let nearest = existing
            .iter()
            .map(|other| haversine_distance_m(point, other))
            .fold(f64::INFINITY, f64::min);

        if nearest >= self.territory_radius_m {
            Ok(())
        } else {
            Err(GeoError::BoundaryViolation {
                distance_m: nearest,
                limit_m: self.territory_radius_m,
                kind: ViolationKind::InsideTerritory,
            })
        }
    }
}

/// Placed flags, gated by the boundary and territory rules
#[derive(Debug, Clone)]
pub struct TerritoryRegistry {
    policy: BoundaryPolicy,
    flags: Vec<GeoPoint>,
}

impl TerritoryRegistry {
    pub fn new(policy: BoundaryPolicy) -> Self {
        Self {
            policy,
            flags: Vec::new(),
        }
    }

    pub fn policy(&self) -> &BoundaryPolicy {
        &self.policy
    }

    pub fn flags(&self) -> &[GeoPoint] {
        &self.flags
    }

    /// Whether a flag could be placed at `point` right now
    pub fn can_place(&self, point: &GeoPoint) -> bool {
        self.check(point).is_ok()
    }

    /// Place a flag, leaving the registry unchanged on rejection
    pub fn try_place(&mut self, point: GeoPoint) -> GeoResult<()> {
        if let Err(e) = self.check(&point) {
            debug!("Flag at {} rejected: {}", point, e);
            return Err(e);
        }

        self.flags.push(point);
        info!("Flag placed at {} ({} total)", point, self.flags.len());
        Ok(())
    }

    /// Remove the flag nearest to `point` if it lies within `within_m`
    pub fn remove_nearest(&mut self, point: &GeoPoint, within_m: f64) -> Option<GeoPoint> {
        let (index, distance) = self
            .flags
            .iter()
            .enumerate()
            .map(|(i, flag)| (i, haversine_distance_m(point, flag)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        if distance <= within_m {
            Some(self.flags.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }

    fn check(&self, point: &GeoPoint) -> GeoResult<()> {
        self.policy.check_boundary(point)?;
        self.policy.check_territory(point, &self.flags)
    }
}
