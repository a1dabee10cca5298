//! Frame-driven state processing

pub mod tracker;

pub use tracker::{
    MoveTicket, MovementPhase, MovementTiming, PlayerMovementState, PlayerPositionTracker,
    SubscriptionHandle, TrackerCallback, TrackerEvent,
};
