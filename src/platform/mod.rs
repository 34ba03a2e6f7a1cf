//! Platform abstraction layer
//!
//! The engine never touches a window, keyboard or clock directly. A
//! platform supplies:
//! - Time (monotonic session clock, seconds)
//! - Input events (non-blocking key polling, once per frame)
//! - Display (draw the object, flip to the next refresh)
//!
//! Blocking waits (question answers, invisible intervals) are expressed as
//! engine states that keep polling every frame, so the display keeps
//! refreshing and abort stays responsive.

pub mod headless;

pub use headless::HeadlessPlatform;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::Wall;

/// Keys the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Escape,
    Space,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Up => "up",
            Key::Down => "down",
            Key::Left => "left",
            Key::Right => "right",
            Key::Escape => "escape",
            Key::Space => "space",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "escape" | "esc" => Some(Key::Escape),
            "space" => Some(Key::Space),
            _ => None,
        }
    }

    /// Arrow keys are the valid question answers
    pub fn is_arrow(&self) -> bool {
        matches!(self, Key::Up | Key::Down | Key::Left | Key::Right)
    }

    /// Arrow key naming a wall (up = top, down = bottom)
    pub fn for_wall(wall: Wall) -> Self {
        match wall {
            Wall::Left => Key::Left,
            Wall::Right => Key::Right,
            Wall::Top => Key::Up,
            Wall::Bottom => Key::Down,
        }
    }
}

/// Everything the display needs for one refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Object position in arena units
    pub pos: Vec2,
    /// Object opacity is 1 when true, 0 otherwise
    pub visible: bool,
    /// The bounce question ([`QUESTION_TEXT`]) is on screen
    pub question: bool,
}

/// Collaborator failures; reported, never fatal to the session
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("display error: {0}")]
    Display(String),
    #[error("input error: {0}")]
    Input(String),
}

/// Host environment for a session
pub trait Platform {
    /// Seconds on the monotonic session clock
    fn now(&self) -> f64;
    /// Keys pressed since the previous poll
    fn poll_keys(&mut self) -> Result<Vec<Key>, PlatformError>;
    /// Draw a frame into the back buffer
    fn render(&mut self, frame: &Frame) -> Result<(), PlatformError>;
    /// Present the back buffer; returns the flip timestamp
    fn flip(&mut self) -> Result<f64, PlatformError>;
}

/// Question shown to the participant
pub const QUESTION_TEXT: &str = "At what surface did the object bounce last time?";
pub const QUESTION_INSTRUCTION: &str = "Use the arrow keys to respond";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parsing() {
        assert_eq!(Key::from_str("Esc"), Some(Key::Escape));
        assert_eq!(Key::from_str("LEFT"), Some(Key::Left));
        assert_eq!(Key::from_str("enter"), None);
    }

    #[test]
    fn test_wall_keys() {
        assert_eq!(Key::for_wall(Wall::Top), Key::Up);
        assert_eq!(Key::for_wall(Wall::Bottom), Key::Down);
        assert!(Key::for_wall(Wall::Left).is_arrow());
        assert!(!Key::Space.is_arrow());
    }
}
