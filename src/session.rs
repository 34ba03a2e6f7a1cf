//! Session run loop
//!
//! One refresh per iteration: poll keys, tick the engine, route triggers,
//! render, flip. Collaborator failures are logged and the loop carries on.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::platform::Platform;
use crate::recorder::SessionRecorder;
use crate::settings::Settings;
use crate::sim::{EngineState, QuestionOutcome, TickInput, TickOutcome, tick};
use crate::trigger::{TriggerChannel, TriggerCode, TriggerSink};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEnd {
    /// Total duration elapsed
    Completed,
    /// Operator pressed escape
    Aborted,
}

impl SessionEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEnd::Completed => "completed",
            SessionEnd::Aborted => "aborted",
        }
    }
}

/// Everything a finished session leaves behind
#[derive(Debug)]
pub struct SessionReport<S> {
    pub end: SessionEnd,
    pub seed: u64,
    /// Session clock when the loop stopped
    pub duration: f64,
    pub recorder: SessionRecorder,
    pub answers: Vec<QuestionOutcome>,
    pub triggers_sent: u32,
    pub triggers_failed: u32,
    pub sink: S,
}

impl<S> SessionReport<S> {
    /// Write the trial data file into `dir`
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        self.recorder.save_csv(dir)
    }

    /// Answers that matched the last bounce
    pub fn correct_answers(&self) -> usize {
        self.answers.iter().filter(|a| a.correct).count()
    }
}

pub struct Session<P: Platform, S: TriggerSink> {
    state: EngineState,
    platform: P,
    triggers: TriggerChannel<S>,
}

impl<P: Platform, S: TriggerSink> Session<P, S> {
    /// Prepare a session; a random seed is drawn when the settings carry none
    pub fn new(settings: Settings, platform: P, sink: S) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random::<u64>);
        Self {
            state: EngineState::new(settings, seed),
            platform,
            triggers: TriggerChannel::new(sink),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Run until the total duration elapses or the operator aborts
    pub fn run(self) -> SessionReport<S> {
        self.run_with(|_, _| {})
    }

    /// Run, calling `observe` with the engine state and platform after every flip
    pub fn run_with<F>(mut self, mut observe: F) -> SessionReport<S>
    where
        F: FnMut(&EngineState, &P),
    {
        log::info!("Session started ({})", self.state.settings.preset.as_str());

        let end = loop {
            let now = self.platform.now();
            let keys = match self.platform.poll_keys() {
                Ok(keys) => keys,
                Err(e) => {
                    log::warn!("Key polling failed: {}", e);
                    Vec::new()
                }
            };

            let outcome = tick(&mut self.state, &TickInput::from_keys(now, &keys));
            for request in self.state.take_triggers() {
                self.triggers.dispatch(request, now);
            }

            match outcome {
                TickOutcome::Running => {}
                TickOutcome::Finished => break SessionEnd::Completed,
                TickOutcome::Aborted => break SessionEnd::Aborted,
            }

            if let Err(e) = self.platform.render(&self.state.frame()) {
                log::warn!("Render failed: {}", e);
            }
            let flipped_at = match self.platform.flip() {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("Flip failed: {}", e);
                    now
                }
            };
            self.triggers.on_flip(flipped_at);
            observe(&self.state, &self.platform);
        };

        self.teardown(end)
    }

    fn teardown(mut self, end: SessionEnd) -> SessionReport<S> {
        let now = self.platform.now();

        // Codes queued for a flip that will never come still go out
        self.triggers.on_flip(now);
        let _ = self.triggers.emit_now(TriggerCode::SessionEnd, now);

        let summary = self.state.recorder.summary();
        log::info!(
            "Session {} at {:.2} sec: {} disappearance(s) ({} predictable, {} unpredictable), {}/{} answer(s) correct",
            end.as_str(),
            now,
            summary.total,
            summary.predictable,
            summary.unpredictable,
            self.state.answers.iter().filter(|a| a.correct).count(),
            self.state.answers.len()
        );
        if self.triggers.failed() > 0 {
            log::warn!("{} trigger(s) could not be sent", self.triggers.failed());
        }

        SessionReport {
            end,
            seed: self.state.seed,
            duration: now,
            triggers_sent: self.triggers.sent(),
            triggers_failed: self.triggers.failed(),
            recorder: std::mem::take(&mut self.state.recorder),
            answers: std::mem::take(&mut self.state.answers),
            sink: self.triggers.into_sink(),
        }
    }
}
