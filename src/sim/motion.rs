//! Single-object motion with clamped wall bounces
//!
//! Position is integrated explicitly (`pos += vel * dt`). When the new
//! position reaches or crosses a wall it is clamped onto that wall and the
//! matching velocity component is negated. Clamping keeps overshoot from
//! accumulating across bounces.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, Wall};
use crate::heading_to_unit;

/// Integrate one step and resolve wall contact.
///
/// Returns the new position, the new velocity, and the last wall struck
/// during this step (x is resolved before y, so a corner hit reports the
/// top/bottom wall).
pub fn integrate(pos: Vec2, vel: Vec2, dt: f32, arena: &Arena) -> (Vec2, Vec2, Option<Wall>) {
    let mut pos = pos + vel * dt;
    let mut vel = vel;
    let mut wall = None;

    if pos.x >= arena.right {
        vel.x = -vel.x;
        pos.x = arena.right;
        wall = Some(Wall::Right);
    } else if pos.x <= arena.left {
        vel.x = -vel.x;
        pos.x = arena.left;
        wall = Some(Wall::Left);
    }

    if pos.y >= arena.top {
        vel.y = -vel.y;
        pos.y = arena.top;
        wall = Some(Wall::Top);
    } else if pos.y <= arena.bottom {
        vel.y = -vel.y;
        pos.y = arena.bottom;
        wall = Some(Wall::Bottom);
    }

    (pos, vel, wall)
}

/// The moving object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionState {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Most recent wall the object bounced off (None until the first bounce)
    pub last_wall: Option<Wall>,
}

impl MotionState {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            last_wall: None,
        }
    }

    /// Start at the origin heading along one of `headings_deg`, picked uniformly
    pub fn launch<R: Rng>(headings_deg: &[f32], speed: f32, rng: &mut R) -> Self {
        let heading = headings_deg.choose(rng).copied().unwrap_or(60.0);
        Self::new(Vec2::ZERO, heading_to_unit(heading) * speed)
    }

    /// Advance by `dt` seconds, recording the wall struck (if any)
    pub fn advance(&mut self, dt: f32, arena: &Arena) -> Option<Wall> {
        let (pos, vel, wall) = integrate(self.pos, self.vel, dt, arena);
        self.pos = pos;
        self.vel = vel;
        if let Some(wall) = wall {
            log::debug!("Bounce: {} wall at ({:.2}, {:.2})", wall.as_str(), pos.x, pos.y);
            self.last_wall = Some(wall);
        }
        wall
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}
