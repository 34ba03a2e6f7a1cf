//! Headless platform with a virtual clock
//!
//! Each flip advances the clock by one frame period, so a session runs as
//! fast as the CPU allows while every timestamp stays frame-accurate. Input
//! comes from a script of timed key presses and, optionally, a simulated
//! participant who answers questions after a fixed reaction time.

use std::collections::VecDeque;

use super::{Frame, Key, Platform, PlatformError, QUESTION_INSTRUCTION, QUESTION_TEXT};

/// Simulated participant answering the bounce question
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Responder {
    pub key: Key,
    /// Seconds between the question appearing and the key press
    pub delay: f64,
}

#[derive(Debug, Clone)]
pub struct HeadlessPlatform {
    frame_period: f64,
    time: f64,
    /// Pending (time, key) presses, sorted by time
    script: VecDeque<(f64, Key)>,
    responder: Option<Responder>,
    question_since: Option<f64>,
    responded: bool,
    frames: u64,
    hidden_frames: u64,
    last_frame: Option<Frame>,
}

impl HeadlessPlatform {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            frame_period: 1.0 / frame_rate.max(1.0),
            time: 0.0,
            script: VecDeque::new(),
            responder: None,
            question_since: None,
            responded: false,
            frames: 0,
            hidden_frames: 0,
            last_frame: None,
        }
    }

    /// Queue a key press at session time `at`
    pub fn press_at(mut self, at: f64, key: Key) -> Self {
        let idx = self.script.partition_point(|(t, _)| *t <= at);
        self.script.insert(idx, (at, key));
        self
    }

    pub fn with_responder(mut self, key: Key, delay: f64) -> Self {
        self.responder = Some(Responder { key, delay });
        self
    }

    /// Frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames presented with the object hidden
    pub fn hidden_frames(&self) -> u64 {
        self.hidden_frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }
}

impl Platform for HeadlessPlatform {
    fn now(&self) -> f64 {
        self.time
    }

    fn poll_keys(&mut self) -> Result<Vec<Key>, PlatformError> {
        let mut keys = Vec::new();
        while let Some(&(at, key)) = self.script.front() {
            if at > self.time {
                break;
            }
            keys.push(key);
            self.script.pop_front();
        }

        if let (Some(responder), Some(since)) = (self.responder, self.question_since) {
            if !self.responded && self.time - since >= responder.delay {
                keys.push(responder.key);
                self.responded = true;
            }
        }

        Ok(keys)
    }

    fn render(&mut self, frame: &Frame) -> Result<(), PlatformError> {
        match (frame.question, self.question_since) {
            (true, None) => {
                log::debug!("Displaying \"{}\" ({})", QUESTION_TEXT, QUESTION_INSTRUCTION);
                self.question_since = Some(self.time);
                self.responded = false;
            }
            (false, Some(_)) => self.question_since = None,
            _ => {}
        }
        self.last_frame = Some(*frame);
        Ok(())
    }

    fn flip(&mut self) -> Result<f64, PlatformError> {
        self.time += self.frame_period;
        self.frames += 1;
        if self.last_frame.is_some_and(|f| !f.visible) {
            self.hidden_frames += 1;
        }
        Ok(self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn frame(question: bool) -> Frame {
        Frame {
            pos: Vec2::ZERO,
            visible: !question,
            question,
        }
    }

    #[test]
    fn test_clock_advances_per_flip() {
        let mut p = HeadlessPlatform::new(60.0);
        assert_eq!(p.now(), 0.0);
        for _ in 0..60 {
            p.flip().unwrap();
        }
        assert!((p.now() - 1.0).abs() < 1e-9);
        assert_eq!(p.frames(), 60);
    }

    #[test]
    fn test_scripted_keys_fire_once_in_order() {
        let mut p = HeadlessPlatform::new(10.0)
            .press_at(0.25, Key::Escape)
            .press_at(0.15, Key::Space);
        assert!(p.poll_keys().unwrap().is_empty());
        p.flip().unwrap();
        p.flip().unwrap();
        assert_eq!(p.poll_keys().unwrap(), vec![Key::Space]);
        p.flip().unwrap();
        assert_eq!(p.poll_keys().unwrap(), vec![Key::Escape]);
        assert!(p.poll_keys().unwrap().is_empty());
    }

    #[test]
    fn test_responder_answers_after_delay() {
        let mut p = HeadlessPlatform::new(10.0).with_responder(Key::Left, 0.5);
        p.render(&frame(true)).unwrap();
        let mut pressed_at = None;
        for _ in 0..10 {
            p.flip().unwrap();
            if p.poll_keys().unwrap().contains(&Key::Left) {
                pressed_at = Some(p.now());
                break;
            }
        }
        assert!(pressed_at.is_some_and(|t| t >= 0.5 - 1e-9));
        assert_eq!(p.hidden_frames(), p.frames());
    }
}
