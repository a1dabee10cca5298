//! Frame-driven player movement
//!
//! The tracker owns the authoritative player position. A move request sets a
//! target and a duration proportional to the great-circle distance; each call
//! to [`PlayerPositionTracker::advance`] interpolates toward the target. There
//! are no internal timers: the host passes its monotonic frame time in.

use crate::algorithms::geodesy::{haversine_distance_m, lerp};
use crate::core::{GeoPoint, MAX_MOVE_DURATION_MS, MOVE_MS_PER_METER};
use crate::validation::boundary::BoundaryPolicy;
use crate::validation::error::{GeoError, GeoResult};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Observer callback for tracker events
pub type TrackerCallback = Box<dyn FnMut(&TrackerEvent) + Send>;

/// Notifications emitted by the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerEvent {
    /// Position updated during a move, including the final frame
    PositionChanged { position: GeoPoint, progress: f64 },
    /// Move finished at the target
    TargetReached { position: GeoPoint },
    /// Move abandoned before reaching the target
    MoveCancelled { position: GeoPoint },
}

/// Subscription handle returned by [`PlayerPositionTracker::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionHandle(u32);

impl SubscriptionHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Idle or interpolating toward a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementPhase {
    Idle,
    Moving,
}

/// Tunables for move duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementTiming {
    pub ms_per_meter: f64,
    pub max_duration_ms: f64,
}

impl Default for MovementTiming {
    fn default() -> Self {
        Self {
            ms_per_meter: MOVE_MS_PER_METER,
            max_duration_ms: MAX_MOVE_DURATION_MS,
        }
    }
}

/// Snapshot of the tracker's movement state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerMovementState {
    pub current: GeoPoint,
    pub target: Option<GeoPoint>,
    pub is_moving: bool,
    pub started_at_ms: f64,
    pub duration_ms: f64,
}

/// An accepted move request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveTicket {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub distance_m: f64,
    pub duration_ms: f64,
}

/// Owns the player's geographic position and its in-flight movement
pub struct PlayerPositionTracker {
    policy: BoundaryPolicy,
    timing: MovementTiming,
    current: GeoPoint,
    move_start: GeoPoint,
    target: Option<GeoPoint>,
    started_at_ms: f64,
    duration_ms: f64,
    progress: f64,
    subscription_counter: u32,
    subscribers: BTreeMap<SubscriptionHandle, TrackerCallback>,
}

impl std::fmt::Debug for PlayerPositionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerPositionTracker")
            .field("current", &self.current)
            .field("target", &self.target)
            .field("progress", &self.progress)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl PlayerPositionTracker {
    /// Start idle at the policy's origin
    pub fn new(policy: BoundaryPolicy) -> Self {
        Self::with_timing(policy, MovementTiming::default())
    }

    pub fn with_timing(policy: BoundaryPolicy, timing: MovementTiming) -> Self {
        Self {
            current: policy.origin,
            move_start: policy.origin,
            policy,
            timing,
            target: None,
            started_at_ms: 0.0,
            duration_ms: 0.0,
            progress: 0.0,
            subscription_counter: 0,
            subscribers: BTreeMap::new(),
        }
    }

    /// Register an observer; callbacks run in subscription order
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&TrackerEvent) + Send + 'static,
    {
        self.subscription_counter += 1;
        let handle = SubscriptionHandle(self.subscription_counter);
        self.subscribers.insert(handle, Box::new(callback));
        handle
    }

    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.subscribers.remove(&handle).is_some()
    }

    /// Request a move; false (state unchanged) when the boundary rejects it
    pub fn set_target(&mut self, target: GeoPoint, now_ms: f64) -> bool {
        self.try_set_target(target, now_ms).is_ok()
    }

    /// Request a move, reporting why a rejected target was refused.
    /// Retargeting mid-move restarts from the interpolated position at `now_ms`;
    /// a previous move whose duration has already elapsed completes first.
    pub fn try_set_target(&mut self, target: GeoPoint, now_ms: f64) -> GeoResult<MoveTicket> {
        if !now_ms.is_finite() {
            return Err(GeoError::InvalidInput {
                field: "now_ms".to_string(),
                value: now_ms.to_string(),
                reason: "frame time must be finite".to_string(),
            });
        }

        if let Err(e) = self.policy.check_boundary(&target) {
            debug!("Move to {} rejected: {}", target, e);
            return Err(e);
        }

        if self.target.is_some() {
            if self.progress_at(now_ms) >= 1.0 {
                self.advance(now_ms);
            } else {
                self.current = self.position_at(now_ms);
            }
        }

        let distance_m = haversine_distance_m(&self.current, &target);
        let duration_ms = (distance_m * self.timing.ms_per_meter).clamp(0.0, self.timing.max_duration_ms);

        self.move_start = self.current;
        self.target = Some(target);
        self.started_at_ms = now_ms;
        self.duration_ms = duration_ms;
        self.progress = 0.0;

        info!(
            from = %self.move_start,
            to = %target,
            distance_m,
            duration_ms,
            "Player move started"
        );

        Ok(MoveTicket {
            from: self.move_start,
            to: target,
            distance_m,
            duration_ms,
        })
    }

    /// Advance the current move to frame time `now_ms`
    pub fn advance(&mut self, now_ms: f64) {
        let Some(target) = self.target else {
            return;
        };
        if !now_ms.is_finite() {
            warn!(now_ms, "Ignoring non-finite frame time");
            return;
        }

        self.progress = self.progress_at(now_ms);
        let finished = self.progress >= 1.0;
        self.current = if finished {
            target
        } else {
            lerp(&self.move_start, &target, self.progress)
        };

        self.notify(TrackerEvent::PositionChanged {
            position: self.current,
            progress: self.progress,
        });

        if finished {
            self.target = None;
            debug!("Player reached {}", self.current);
            self.notify(TrackerEvent::TargetReached { position: self.current });
        }
    }

    /// Abandon the current move where it stands
    pub fn cancel(&mut self) {
        if self.target.take().is_some() {
            debug!("Player move cancelled at {}", self.current);
            self.notify(TrackerEvent::MoveCancelled { position: self.current });
        }
    }

    /// Return to the origin, dropping any move in flight
    pub fn reset(&mut self) {
        self.target = None;
        self.current = self.policy.origin;
        self.move_start = self.policy.origin;
        self.progress = 0.0;
    }

    pub fn current(&self) -> GeoPoint {
        self.current
    }

    pub fn target(&self) -> Option<GeoPoint> {
        self.target
    }

    pub fn is_moving(&self) -> bool {
        self.target.is_some()
    }

    pub fn phase(&self) -> MovementPhase {
        if self.is_moving() {
            MovementPhase::Moving
        } else {
            MovementPhase::Idle
        }
    }

    /// Progress of the last advanced frame (0-1)
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn policy(&self) -> &BoundaryPolicy {
        &self.policy
    }

    pub fn state(&self) -> PlayerMovementState {
        PlayerMovementState {
            current: self.current,
            target: self.target,
            is_moving: self.is_moving(),
            started_at_ms: self.started_at_ms,
            duration_ms: self.duration_ms,
        }
    }

    fn progress_at(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 || now_ms >= self.started_at_ms + self.duration_ms {
            return 1.0;
        }
        ((now_ms - self.started_at_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    fn position_at(&self, now_ms: f64) -> GeoPoint {
        match self.target {
            Some(target) => lerp(&self.move_start, &target, self.progress_at(now_ms)),
            None => self.current,
        }
    }

    fn notify(&mut self, event: TrackerEvent) {
        for callback in self.subscribers.values_mut() {
            callback(&event);
        }
    }
}
