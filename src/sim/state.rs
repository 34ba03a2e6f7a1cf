//! Engine state and scheduler phases
//!
//! Everything a session mutates lives in one owned `EngineState`; the tick
//! function is its only writer.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, Corner, Wall};
use super::motion::MotionState;
use super::sequence::{TrialSequence, TrialType};
use crate::platform::{Frame, Key};
use crate::recorder::SessionRecorder;
use crate::settings::Settings;
use crate::trigger::{Timing, TriggerCode, TriggerRequest};

/// Sub-stage of a disappearance cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CycleStage {
    /// Object on screen, countdown running
    Visible,
    /// Object hidden until `until`; strategy applied when it expires
    Hidden {
        until: f64,
        trial: TrialType,
        disappeared_in_corner: bool,
    },
}

/// Sub-stage of the closing run toward a corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FinalStage {
    /// Object hidden before it is re-centred
    Hidden { until: f64 },
    /// Object travelling toward `target`
    Moving { target: Corner, exit_marked: bool },
}

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    /// Free bouncing before any manipulation
    Baseline,
    /// Disappearance cycles running
    ActiveCycling(CycleStage),
    /// Question on screen; nothing else happens until it is answered
    QuestionPaused { index: usize },
    /// Closing exit toward a corner
    FinalSequence(FinalStage),
    /// Object gone for good; display keeps refreshing until the session ends
    Ended,
}

/// How a bounce question was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    /// Index into `Settings::question_times`
    pub index: usize,
    pub expected: Option<Wall>,
    pub given: Key,
    pub correct: bool,
}

/// Complete engine state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct EngineState {
    pub settings: Settings,
    /// Validated arena (default arena when the configured one is malformed)
    pub arena: Arena,
    pub seed: u64,
    pub(crate) rng: Pcg32,

    pub phase: Phase,
    pub motion: MotionState,
    /// Object opacity (true = drawn)
    pub visible: bool,
    pub sequence: TrialSequence,
    pub recorder: SessionRecorder,
    pub answers: Vec<QuestionOutcome>,

    /// Session clock reading of the latest tick (seconds)
    pub elapsed: f64,
    /// Session clock reading when the per-cycle clock was last reset
    pub cycle_started: f64,
    /// Per-cycle countdown until the next disappearance (seconds)
    pub next_disappearance: f64,

    pub skip_requested: bool,
    pub baseline_ended: bool,
    pub questions_asked: Vec<bool>,
    pub final_triggered: bool,
    /// Number the next disappearance will get (1-based)
    pub disappearance_counter: u32,

    pub(crate) triggers: Vec<TriggerRequest>,
}

impl EngineState {
    /// Build the engine for a session
    pub fn new(settings: Settings, seed: u64) -> Self {
        let arena = match settings.arena.validate() {
            Ok(()) => settings.arena.clone(),
            Err(e) => {
                log::error!("Invalid arena geometry ({e}); using default arena");
                Arena::default()
            }
        };

        let mut rng = Pcg32::seed_from_u64(seed);
        let motion = MotionState::launch(&settings.deviation.headings_deg, settings.speed, &mut rng);
        let next_disappearance = draw_countdown(&settings, &mut rng);
        let questions_asked = vec![false; settings.question_times.len()];
        let sequence = TrialSequence::new(settings.sequence);

        log::info!(
            "Session seed {} ({} s total, {} s baseline, {} question(s))",
            seed,
            settings.total_duration,
            settings.baseline_duration,
            settings.question_times.len()
        );

        let mut state = Self {
            settings,
            arena,
            seed,
            rng,
            phase: Phase::Baseline,
            motion,
            visible: true,
            sequence,
            recorder: SessionRecorder::new(),
            answers: Vec::new(),
            elapsed: 0.0,
            cycle_started: 0.0,
            next_disappearance,
            skip_requested: false,
            baseline_ended: false,
            questions_asked,
            final_triggered: false,
            disappearance_counter: 1,
            triggers: Vec::new(),
        };
        state.emit(TriggerCode::SessionStart, Timing::OnFlip);
        state
    }

    /// Time on the per-cycle clock
    #[inline]
    pub fn cycle_elapsed(&self) -> f64 {
        self.elapsed - self.cycle_started
    }

    /// Reset the per-cycle clock without drawing a new countdown
    pub fn reset_cycle_clock(&mut self) {
        self.cycle_started = self.elapsed;
    }

    /// Reset the per-cycle clock and draw a fresh countdown
    pub fn restart_cycle(&mut self) {
        self.reset_cycle_clock();
        self.next_disappearance = draw_countdown(&self.settings, &mut self.rng);
    }

    /// Request a marker code
    pub fn emit(&mut self, code: TriggerCode, timing: Timing) {
        self.triggers.push(TriggerRequest { code, timing });
    }

    /// Codes requested since the last call, in request order
    pub fn take_triggers(&mut self) -> Vec<TriggerRequest> {
        std::mem::take(&mut self.triggers)
    }

    /// What the display should show this refresh
    pub fn frame(&self) -> Frame {
        Frame {
            pos: self.motion.pos,
            visible: self.visible,
            question: matches!(self.phase, Phase::QuestionPaused { .. }),
        }
    }

    /// Remaining session time
    #[inline]
    pub fn remaining(&self) -> f64 {
        self.settings.total_duration - self.elapsed
    }
}

fn draw_countdown<R: Rng>(settings: &Settings, rng: &mut R) -> f64 {
    let lo = settings.min_disappearance_interval;
    let hi = settings.max_disappearance_interval.max(lo);
    rng.random_range(lo..=hi)
}
