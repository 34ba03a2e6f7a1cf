//! Occlusion Task - bouncing-object disappearance paradigm
//!
//! Core modules:
//! - `sim`: Deterministic engine (motion, reappearance strategies, scheduler)
//! - `trigger`: Frame-synchronized event marker channel
//! - `recorder`: Per-disappearance outcome log and export
//! - `session`: Cooperative run loop tying the engine to a platform
//! - `platform`: Clock/input/display abstraction (headless implementation included)
//! - `settings`: Data-driven session configuration

pub mod error;
pub mod logging;
pub mod platform;
pub mod recorder;
pub mod session;
pub mod settings;
pub mod sim;
pub mod trigger;

pub use error::{Error, Result};
pub use recorder::{DisappearanceRecord, SessionRecorder};
pub use session::{Session, SessionEnd, SessionReport};
pub use settings::{SessionPreset, Settings};
pub use trigger::{TriggerChannel, TriggerCode, TriggerSink};

use glam::Vec2;

/// Session configuration constants (defaults for `Settings`)
pub mod consts {
    /// Display refresh rate assumed by the headless platform
    pub const FRAME_RATE: f64 = 60.0;

    /// Arena bounds (normalized units)
    pub const LEFT_BOUND: f32 = -0.8;
    pub const RIGHT_BOUND: f32 = 0.8;
    pub const BOTTOM_BOUND: f32 = -0.8;
    pub const TOP_BOUND: f32 = 0.8;

    /// Inner edge of the corner classification zones
    pub const CORNER_ZONE_INNER: f32 = 0.6;

    /// Object speed in units per second (0.004 per frame at 60 Hz)
    pub const OBJECT_SPEED: f32 = 0.24;

    /// Diagonal headings the object travels along (degrees)
    pub const HEADINGS_DEG: [f32; 4] = [60.0, -60.0, 120.0, -120.0];

    /// Candidate deviation angles for unpredictable reappearances (degrees)
    pub const DEVIATION_ANGLES_DEG: [f32; 8] = [10.0, 55.0, 100.0, 145.0, 190.0, 235.0, 280.0, 325.0];
    /// Deviation distance as a fraction of the arena span
    pub const DEVIATION_FRACTION: f32 = 0.60;

    /// Time the object stays hidden during a disappearance (seconds)
    pub const INVISIBLE_DURATION: f64 = 1.5;
    /// Range of the randomized countdown between disappearances (seconds)
    pub const MIN_DISAPPEARANCE_INTERVAL: f64 = 4.0;
    pub const MAX_DISAPPEARANCE_INTERVAL: f64 = 8.0;

    /// Baseline phase length (seconds)
    pub const BASELINE_DURATION: f64 = 30.0;
    /// A question becomes due this long before its scheduled offset (seconds)
    pub const QUESTION_TOLERANCE: f64 = 1.0;

    /// Final sequence starts when this much session time remains (seconds)
    pub const FINAL_WINDOW: f64 = 10.0;
    /// Hidden pause before the final run toward a corner (seconds)
    pub const FINAL_DELAY: f64 = 1.5;
    /// Coordinate magnitude that fires the boundary-exit marker
    pub const FINAL_INNER_MARGIN: f32 = 1.0;
    /// Coordinate magnitude at which the object is gone for good
    pub const FINAL_OUTER_MARGIN: f32 = 1.2;

    /// Trial sequence composition: fixed predictable lead, then a shuffled tail
    pub const SEQUENCE_LEAD_PREDICTABLE: usize = 4;
    pub const SEQUENCE_TAIL_PREDICTABLE: usize = 2;
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

/// Unit vector for a heading given in degrees
#[inline]
pub fn heading_to_unit(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Heading of a vector in degrees, in (-180, 180]
#[inline]
pub fn heading_degrees(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Absolute angular distance between two headings (degrees, wrapped)
#[inline]
pub fn heading_distance(a_deg: f32, b_deg: f32) -> f32 {
    normalize_angle((a_deg - b_deg).to_radians()).abs().to_degrees()
}
