//! Reappearance strategies
//!
//! Both strategies share one contract: given the object's position and
//! velocity at the moment it vanished and the length of the invisible
//! interval, produce the position and velocity it reappears with.
//!
//! - Predictable: continue the motion (with the same clamp/reflect rule as
//!   the per-tick integrator) over the whole interval.
//! - Unpredictable: start from the predictable position, jump a large fixed
//!   distance along one of a fixed set of angles (only candidates that stay
//!   inside the arena), and turn onto a different diagonal heading.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::motion::integrate;
use super::sequence::TrialType;
use crate::consts::*;
use crate::{heading_degrees, heading_distance, heading_to_unit};

/// Outcome of a reappearance strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reappearance {
    pub pos: Vec2,
    pub vel: Vec2,
    /// No deviation candidate fit in the arena; `pos` is the unmodified expected position
    pub degraded: bool,
}

/// Tunables for the unpredictable strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviationParams {
    /// Jump distance as a fraction of the arena width/height
    pub fraction: f32,
    /// Candidate jump directions (degrees)
    pub angles_deg: Vec<f32>,
    /// Headings the object may leave on (degrees)
    pub headings_deg: Vec<f32>,
}

impl Default for DeviationParams {
    fn default() -> Self {
        Self {
            fraction: DEVIATION_FRACTION,
            angles_deg: DEVIATION_ANGLES_DEG.to_vec(),
            headings_deg: HEADINGS_DEG.to_vec(),
        }
    }
}

impl TrialType {
    /// Apply the strategy for this trial type
    pub fn reappear<R: Rng>(
        self,
        pos: Vec2,
        vel: Vec2,
        interval: f32,
        arena: &Arena,
        params: &DeviationParams,
        rng: &mut R,
    ) -> Reappearance {
        match self {
            TrialType::Predictable => {
                let (pos, vel) = predictable(pos, vel, interval, arena);
                Reappearance {
                    pos,
                    vel,
                    degraded: false,
                }
            }
            TrialType::Unpredictable => unpredictable(pos, vel, interval, arena, params, rng),
        }
    }
}

/// Extrapolate the motion over the invisible interval
pub fn predictable(pos: Vec2, vel: Vec2, interval: f32, arena: &Arena) -> (Vec2, Vec2) {
    let (pos, vel, _wall) = integrate(pos, vel, interval, arena);
    (pos, vel)
}

/// In-bounds jump candidates around the expected position
pub fn deviation_candidates(expected: Vec2, arena: &Arena, params: &DeviationParams) -> Vec<Vec2> {
    let max_dx = arena.width() * params.fraction;
    let max_dy = arena.height() * params.fraction;

    params
        .angles_deg
        .iter()
        .map(|deg| {
            let rad = deg.to_radians();
            expected + Vec2::new(rad.cos() * max_dx, rad.sin() * max_dy)
        })
        .filter(|p| arena.contains(*p))
        .collect()
}

/// The heading in `headings_deg` closest to the direction of `vel`
pub fn closest_heading(vel: Vec2, headings_deg: &[f32]) -> Option<f32> {
    let current = heading_degrees(vel);
    headings_deg.iter().copied().min_by(|a, b| {
        heading_distance(*a, current)
            .partial_cmp(&heading_distance(*b, current))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Pick a heading different from the one closest to `vel`
pub fn reselect_heading<R: Rng>(vel: Vec2, headings_deg: &[f32], rng: &mut R) -> Option<f32> {
    let closest = closest_heading(vel, headings_deg)?;
    let others: Vec<f32> = headings_deg
        .iter()
        .copied()
        .filter(|h| *h != closest)
        .collect();
    others.choose(rng).copied()
}

/// Displace the object and turn it onto a new diagonal at its current speed
pub fn unpredictable<R: Rng>(
    pos: Vec2,
    vel: Vec2,
    interval: f32,
    arena: &Arena,
    params: &DeviationParams,
    rng: &mut R,
) -> Reappearance {
    let (expected, _) = predictable(pos, vel, interval, arena);

    let candidates = deviation_candidates(expected, arena, params);
    let (new_pos, degraded) = match candidates.choose(rng) {
        Some(p) => (*p, false),
        None => {
            log::warn!(
                "No valid deviations found from ({:.2}, {:.2}). Using expected position.",
                expected.x,
                expected.y
            );
            (expected, true)
        }
    };

    let new_vel = match reselect_heading(vel, &params.headings_deg, rng) {
        Some(heading) => heading_to_unit(heading) * vel.length(),
        None => {
            log::warn!("Heading set too small to change direction; keeping current velocity");
            vel
        }
    };

    Reappearance {
        pos: new_pos,
        vel: new_vel,
        degraded,
    }
}
