//! Physics simulation module
//!
//! Kinematic locomotion (custom integration, без rigid body solver) и
//! spatial-query seam. Интеграция в FixedUpdate.

pub mod movement;
pub mod spatial;


// Re-export основных типов
pub use movement::{
    integrate_locomotion, turn_towards, yaw_rotation, ActiveDash, LocomotionBody,
    LocomotionConfig, LocomotionPlugin, LocomotionStep,
};
pub use spatial::{FlatArena, GroundContact, SpatialQueries, SpatialQuery, SweepHit};
