//! Arena bounds and corner zones
//!
//! The arena is an axis-aligned rectangle in normalized units. Corner zones
//! are small rectangles near each corner used only for classification; they
//! are not the bounce boundary itself.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Geometry validation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("bounds are not ordered (left {left} / right {right}, bottom {bottom} / top {top})")]
    UnorderedBounds {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
    },
    #[error("corner zone {0:?} has min > max")]
    UnorderedZone(Corner),
    #[error("corner zones {0:?} and {1:?} overlap")]
    OverlappingZones(Corner, Corner),
}

/// The four named corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }
}

/// Arena walls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

impl Wall {
    pub fn as_str(&self) -> &'static str {
        match self {
            Wall::Left => "left",
            Wall::Right => "right",
            Wall::Top => "top",
            Wall::Bottom => "bottom",
        }
    }
}

/// Inclusive rectangle classifying positions as "near a corner"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerZone {
    pub corner: Corner,
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl CornerZone {
    pub fn new(corner: Corner, x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> Self {
        Self {
            corner,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        self.x_min <= p.x && p.x <= self.x_max && self.y_min <= p.y && p.y <= self.y_max
    }

    /// Closed-interval overlap test (touching edges count as overlap)
    pub fn overlaps(&self, other: &CornerZone) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }
}

/// Bounded arena plus its corner zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub corner_zones: Vec<CornerZone>,
}

impl Default for Arena {
    fn default() -> Self {
        let inner = CORNER_ZONE_INNER;
        Self {
            left: LEFT_BOUND,
            right: RIGHT_BOUND,
            bottom: BOTTOM_BOUND,
            top: TOP_BOUND,
            corner_zones: vec![
                CornerZone::new(Corner::TopLeft, LEFT_BOUND, -inner, inner, TOP_BOUND),
                CornerZone::new(Corner::TopRight, inner, RIGHT_BOUND, inner, TOP_BOUND),
                CornerZone::new(Corner::BottomLeft, LEFT_BOUND, -inner, BOTTOM_BOUND, -inner),
                CornerZone::new(Corner::BottomRight, inner, RIGHT_BOUND, BOTTOM_BOUND, -inner),
            ],
        }
    }
}

impl Arena {
    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Inclusive containment check
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        self.left <= p.x && p.x <= self.right && self.bottom <= p.y && p.y <= self.top
    }

    /// The corner zone a position falls in, if any
    pub fn corner_at(&self, p: Vec2) -> Option<Corner> {
        self.corner_zones
            .iter()
            .find(|zone| zone.contains(p))
            .map(|zone| zone.corner)
    }

    pub fn is_near_corner(&self, p: Vec2) -> bool {
        self.corner_at(p).is_some()
    }

    /// Coordinates of the arena corner itself
    pub fn corner_point(&self, corner: Corner) -> Vec2 {
        match corner {
            Corner::TopLeft => Vec2::new(self.left, self.top),
            Corner::TopRight => Vec2::new(self.right, self.top),
            Corner::BottomLeft => Vec2::new(self.left, self.bottom),
            Corner::BottomRight => Vec2::new(self.right, self.bottom),
        }
    }

    /// Check bounds ordering and that no two corner zones overlap
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !(self.left < self.right && self.bottom < self.top) {
            return Err(GeometryError::UnorderedBounds {
                left: self.left,
                right: self.right,
                bottom: self.bottom,
                top: self.top,
            });
        }

        for zone in &self.corner_zones {
            if zone.x_min > zone.x_max || zone.y_min > zone.y_max {
                return Err(GeometryError::UnorderedZone(zone.corner));
            }
        }

        for (i, a) in self.corner_zones.iter().enumerate() {
            for b in &self.corner_zones[i + 1..] {
                if a.overlaps(b) {
                    return Err(GeometryError::OverlappingZones(a.corner, b.corner));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arena_is_valid() {
        assert_eq!(Arena::default().validate(), Ok(()));
    }

    #[test]
    fn test_corner_classification() {
        let arena = Arena::default();
        assert_eq!(arena.corner_at(Vec2::new(-0.7, 0.7)), Some(Corner::TopLeft));
        assert_eq!(arena.corner_at(Vec2::new(0.8, 0.6)), Some(Corner::TopRight));
        assert_eq!(arena.corner_at(Vec2::new(-0.6, -0.8)), Some(Corner::BottomLeft));
        assert_eq!(arena.corner_at(Vec2::new(0.65, -0.75)), Some(Corner::BottomRight));
        assert_eq!(arena.corner_at(Vec2::ZERO), None);
        // Along an edge but outside the zone band
        assert_eq!(arena.corner_at(Vec2::new(0.8, 0.0)), None);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let arena = Arena::default();
        assert!(arena.contains(Vec2::new(0.8, -0.8)));
        assert!(!arena.contains(Vec2::new(0.8001, 0.0)));
    }

    #[test]
    fn test_overlapping_zones_rejected() {
        let mut arena = Arena::default();
        arena.corner_zones[1] = CornerZone::new(Corner::TopRight, -0.7, 0.8, 0.6, 0.8);
        assert_eq!(
            arena.validate(),
            Err(GeometryError::OverlappingZones(Corner::TopLeft, Corner::TopRight))
        );
    }

    #[test]
    fn test_unordered_bounds_rejected() {
        let arena = Arena {
            left: 0.5,
            right: -0.5,
            ..Arena::default()
        };
        assert!(matches!(
            arena.validate(),
            Err(GeometryError::UnorderedBounds { .. })
        ));
    }

    #[test]
    fn test_corner_points() {
        let arena = Arena::default();
        assert_eq!(arena.corner_point(Corner::TopLeft), Vec2::new(-0.8, 0.8));
        assert_eq!(arena.corner_point(Corner::BottomRight), Vec2::new(0.8, -0.8));
    }
}
