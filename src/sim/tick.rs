//! Per-refresh scheduler tick
//!
//! Advances the session state machine by one display refresh. All waits
//! (invisible interval, question answer, final delay) are phases that keep
//! the scheduler from doing anything else until they resolve.

use glam::Vec2;
use rand::seq::IndexedRandom;

use super::arena::Corner;
use super::sequence::TrialType;
use super::state::{CycleStage, EngineState, FinalStage, Phase, QuestionOutcome};
use crate::platform::Key;
use crate::recorder::DisappearanceRecord;
use crate::trigger::{Timing, TriggerCode};

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Session clock reading (seconds since session start)
    pub elapsed: f64,
    /// Skip the rest of the baseline (space)
    pub skip_baseline: bool,
    /// End the session now (escape)
    pub abort: bool,
    /// Arrow key pressed this refresh, if any
    pub answer: Option<Key>,
}

impl TickInput {
    /// Map polled keys onto tick input
    pub fn from_keys(elapsed: f64, keys: &[Key]) -> Self {
        Self {
            elapsed,
            skip_baseline: keys.contains(&Key::Space),
            abort: keys.contains(&Key::Escape),
            answer: keys.iter().copied().find(Key::is_arrow),
        }
    }
}

/// Result of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep refreshing
    Running,
    /// Session clock reached the total duration
    Finished,
    /// Abort signal received. Ends the whole session from any phase,
    /// including the final run toward a corner (escape there does not just
    /// cut the run short while the display keeps refreshing).
    Aborted,
}

/// Advance the session by one refresh
pub fn tick(state: &mut EngineState, input: &TickInput) -> TickOutcome {
    let now = input.elapsed;
    let dt = (now - state.elapsed).max(0.0) as f32;
    state.elapsed = now;

    if now >= state.settings.total_duration {
        return TickOutcome::Finished;
    }

    if input.abort {
        log::info!("[{:.2} sec] Session aborted", now);
        return TickOutcome::Aborted;
    }

    if input.skip_baseline && !state.skip_requested && state.phase == Phase::Baseline {
        state.skip_requested = true;
        log::info!("[{:.2} sec] Baseline skipped.", now);
    }

    match state.phase {
        Phase::Baseline => {
            if now > state.settings.baseline_duration || state.skip_requested {
                end_baseline(state);
            }
            state.motion.advance(dt, &state.arena);
        }

        Phase::ActiveCycling(CycleStage::Visible) => {
            if let Some(index) = due_question(state) {
                show_question(state, index);
            } else if !state.final_triggered && state.remaining() <= state.settings.final_window {
                begin_final(state);
            } else if state.cycle_elapsed() >= state.next_disappearance {
                begin_disappearance(state);
            } else {
                state.motion.advance(dt, &state.arena);
            }
        }

        Phase::ActiveCycling(CycleStage::Hidden {
            until,
            trial,
            disappeared_in_corner,
        }) => {
            if now >= until {
                finish_disappearance(state, trial, disappeared_in_corner);
                state.motion.advance(dt, &state.arena);
            }
        }

        Phase::QuestionPaused { index } => {
            if let Some(key) = input.answer {
                answer_question(state, index, key);
            }
        }

        Phase::FinalSequence(FinalStage::Hidden { until }) => {
            if now >= until {
                start_final_run(state);
            }
        }

        Phase::FinalSequence(FinalStage::Moving {
            target,
            exit_marked,
        }) => {
            step_final_run(state, target, exit_marked, dt);
        }

        Phase::Ended => {}
    }

    TickOutcome::Running
}

fn end_baseline(state: &mut EngineState) {
    if !state.baseline_ended {
        state.baseline_ended = true;
        state.emit(TriggerCode::BaselineEnd, Timing::OnFlip);
        log::info!("[{:.2} sec] Baseline ended.", state.elapsed);
    }
    state.phase = Phase::ActiveCycling(CycleStage::Visible);
    state.restart_cycle();
}

/// First question not yet asked whose offset (minus tolerance) has passed
fn due_question(state: &EngineState) -> Option<usize> {
    let tolerance = state.settings.question_tolerance;
    state
        .settings
        .question_times
        .iter()
        .zip(&state.questions_asked)
        .position(|(t, asked)| !*asked && state.elapsed >= t - tolerance)
}

fn show_question(state: &mut EngineState, index: usize) {
    state.phase = Phase::QuestionPaused { index };
    state.emit(TriggerCode::QuestionShown, Timing::OnFlip);
    log::info!("[{:.2} sec] Question {} shown.", state.elapsed, index + 1);
}

fn answer_question(state: &mut EngineState, index: usize, key: Key) {
    let expected = state.motion.last_wall;
    let correct = expected.map(Key::for_wall) == Some(key);

    state.emit(TriggerCode::answer(correct), Timing::Immediate);
    log::info!(
        "[{:.2} sec] Answer received: {} (Expected: {}, Given: {})",
        state.elapsed,
        if correct { "Correct" } else { "Incorrect" },
        expected.map(|w| Key::for_wall(w).as_str()).unwrap_or("none"),
        key.as_str()
    );
    state.emit(TriggerCode::QuestionCleared, Timing::OnFlip);

    if let Some(asked) = state.questions_asked.get_mut(index) {
        *asked = true;
    }
    state.answers.push(QuestionOutcome {
        index,
        expected,
        given: key,
        correct,
    });

    state.phase = Phase::ActiveCycling(CycleStage::Visible);
    state.reset_cycle_clock();
}

fn begin_disappearance(state: &mut EngineState) {
    let trial = state.sequence.current();
    let pos = state.motion.pos;
    let in_corner = state.arena.is_near_corner(pos);

    log::info!(
        " ---- Disappearance {}: {} ----",
        state.disappearance_counter,
        trial.as_str()
    );

    state.visible = false;
    state.emit(TriggerCode::disappearance(in_corner), Timing::OnFlip);
    log::info!(
        "[{:.2} sec] Object disappeared at ({:.2}, {:.2}). In corner: {}",
        state.elapsed,
        pos.x,
        pos.y,
        in_corner
    );

    state.phase = Phase::ActiveCycling(CycleStage::Hidden {
        until: state.elapsed + state.settings.invisible_duration,
        trial,
        disappeared_in_corner: in_corner,
    });
}

fn finish_disappearance(state: &mut EngineState, trial: TrialType, disappeared_in_corner: bool) {
    let interval = state.settings.invisible_duration as f32;
    let outcome = trial.reappear(
        state.motion.pos,
        state.motion.vel,
        interval,
        &state.arena,
        &state.settings.deviation,
        &mut state.rng,
    );
    state.motion.pos = outcome.pos;
    state.motion.vel = outcome.vel;
    state.visible = true;

    let in_corner = state.arena.is_near_corner(outcome.pos);
    log::info!(
        "[{:.2} sec] Object reappeared at ({:.2}, {:.2}). In corner: {}",
        state.elapsed,
        outcome.pos.x,
        outcome.pos.y,
        in_corner
    );

    state.recorder.push(DisappearanceRecord {
        disappearance_number: state.disappearance_counter,
        disappeared_in_corner,
        reappearance_type: trial,
        reappeared_in_corner: in_corner,
    });
    state.disappearance_counter += 1;

    state.emit(TriggerCode::reappearance(trial, in_corner), Timing::OnFlip);

    state.restart_cycle();
    state.sequence.advance(&mut state.rng);
    state.phase = Phase::ActiveCycling(CycleStage::Visible);
}

fn begin_final(state: &mut EngineState) {
    log::info!(" ---Final disappearance triggered ([{:.2} sec]). ----", state.elapsed);
    state.final_triggered = true;
    state.visible = false;
    state.phase = Phase::FinalSequence(FinalStage::Hidden {
        until: state.elapsed + state.settings.final_delay,
    });
}

fn start_final_run(state: &mut EngineState) {
    let target = Corner::ALL
        .choose(&mut state.rng)
        .copied()
        .unwrap_or(Corner::TopRight);
    let dir = (state.arena.corner_point(target) - Vec2::ZERO).normalize_or_zero();

    state.motion.pos = Vec2::ZERO;
    state.motion.vel = dir * state.settings.speed;
    state.visible = true;
    state.emit(TriggerCode::FinalSequenceStart, Timing::OnFlip);
    log::info!(
        "[{:.2} sec] Object re-centred, heading {}",
        state.elapsed,
        target.as_str()
    );

    state.phase = Phase::FinalSequence(FinalStage::Moving {
        target,
        exit_marked: false,
    });
}

fn step_final_run(state: &mut EngineState, target: Corner, exit_marked: bool, dt: f32) {
    // No bounce: the object leaves the arena
    state.motion.pos += state.motion.vel * dt;
    let extent = state.motion.pos.abs().max_element();

    let mut exit_marked = exit_marked;
    if !exit_marked && extent > state.settings.final_inner_margin {
        state.emit(TriggerCode::BoundaryExit, Timing::OnFlip);
        exit_marked = true;
    }

    if extent > state.settings.final_outer_margin {
        state.visible = false;
        state.phase = Phase::Ended;
        log::info!(
            "[{:.2} sec] The object has disappeared through the {}.",
            state.elapsed,
            target.as_str()
        );
    } else {
        state.phase = Phase::FinalSequence(FinalStage::Moving {
            target,
            exit_marked,
        });
    }
}
