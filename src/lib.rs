//! Hush Hour - a top-down library survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, behavior, economy, waves)
//! - `timestep`: Fixed timestep driver with render interpolation
//! - `host`: Run lifecycle (named scenes, upgrade interrupt, game over)
//! - `audio` / `present`: Narrow interfaces to playback and rendering
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod error;
pub mod host;
pub mod present;
pub mod sim;
pub mod timestep;
pub mod tuning;

pub use error::{HostError, TuningError};
pub use host::Host;
pub use sim::Run;
pub use timestep::FixedTimestep;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest real frame delta accepted before clamping (seconds)
    pub const MAX_FRAME_DT: f32 = 0.24;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 240;

    /// World units: one meter is one floor tile
    pub const PIXELS_PER_METER: f32 = 32.0;

    /// Player body (visual box and hitbox inside it)
    pub const PLAYER_WIDTH: f32 = 48.0;
    pub const PLAYER_HEIGHT: f32 = 64.0;
    pub const PLAYER_HITBOX_OFFSET: (f32, f32) = (8.0, 24.0);
    pub const PLAYER_HITBOX_SIZE: (f32, f32) = (32.0, 36.0);

    /// Kid body (hitbox == visual box)
    pub const KID_WIDTH: f32 = 32.0;
    pub const KID_HEIGHT: f32 = 40.0;

    /// Book body
    pub const BOOK_WIDTH: f32 = 16.0;
    pub const BOOK_HEIGHT: f32 = 20.0;
    pub const BOOK_HITBOX_OFFSET: (f32, f32) = (2.0, 2.0);
    pub const BOOK_HITBOX_SIZE: (f32, f32) = (12.0, 16.0);
    /// Per-tick velocity retention for sliding books
    pub const BOOK_FRICTION: f32 = 0.9;
    /// Books slower than this on both axes come to rest
    pub const BOOK_REST_SPEED: f32 = 5.0;

    /// Shelf body
    pub const SHELF_WIDTH: f32 = 64.0;
    pub const SHELF_HEIGHT: f32 = 96.0;
    pub const SHELF_CAPACITY: usize = 6;

    /// Ticks between integrity audits (2 seconds at 60 Hz)
    pub const AUDIT_INTERVAL_TICKS: u64 = 120;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for a heading angle (radians, screen space: +y is down)
#[inline]
pub fn heading_vector(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Heading angle pointing from `from` toward `to`
#[inline]
pub fn heading_toward(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Convert meters to world pixels
#[inline]
pub fn meters_to_pixels(meters: f32) -> f32 {
    meters * consts::PIXELS_PER_METER
}
