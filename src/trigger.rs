//! Event marker channel
//!
//! Every state transition of a session maps to exactly one integer code
//! sent to an external acquisition system. Codes are normally queued and
//! delivered on the next display flip so the marker lands on the frame that
//! makes the transition visible. Delivery is best-effort: a failed emission
//! is logged with its code and reason, counted, and never retried.

use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker timeline file name inside the output directory
pub const MARKERS_FILE: &str = "markers.csv";

/// Marker codes (wire values are fixed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TriggerCode {
    SessionStart = 1,
    BaselineEnd = 2,
    SessionEnd = 3,
    QuestionShown = 4,
    QuestionCleared = 5,
    DisappearNormal = 10,
    DisappearCorner = 11,
    AnswerCorrect = 40,
    AnswerIncorrect = 41,
    FinalSequenceStart = 98,
    BoundaryExit = 99,
    ReappearPredictable = 200,
    ReappearPredictableCorner = 201,
    ReappearUnpredictable = 210,
    ReappearUnpredictableCorner = 211,
}

impl TriggerCode {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        use TriggerCode::*;
        Some(match code {
            1 => SessionStart,
            2 => BaselineEnd,
            3 => SessionEnd,
            4 => QuestionShown,
            5 => QuestionCleared,
            10 => DisappearNormal,
            11 => DisappearCorner,
            40 => AnswerCorrect,
            41 => AnswerIncorrect,
            98 => FinalSequenceStart,
            99 => BoundaryExit,
            200 => ReappearPredictable,
            201 => ReappearPredictableCorner,
            210 => ReappearUnpredictable,
            211 => ReappearUnpredictableCorner,
            _ => return None,
        })
    }

    pub fn disappearance(in_corner: bool) -> Self {
        if in_corner {
            TriggerCode::DisappearCorner
        } else {
            TriggerCode::DisappearNormal
        }
    }

    pub fn reappearance(trial: crate::sim::TrialType, in_corner: bool) -> Self {
        use crate::sim::TrialType;
        match (trial, in_corner) {
            (TrialType::Predictable, false) => TriggerCode::ReappearPredictable,
            (TrialType::Predictable, true) => TriggerCode::ReappearPredictableCorner,
            (TrialType::Unpredictable, false) => TriggerCode::ReappearUnpredictable,
            (TrialType::Unpredictable, true) => TriggerCode::ReappearUnpredictableCorner,
        }
    }

    pub fn answer(correct: bool) -> Self {
        if correct {
            TriggerCode::AnswerCorrect
        } else {
            TriggerCode::AnswerIncorrect
        }
    }
}

/// When a queued code should go out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Deliver on the next display flip
    OnFlip,
    /// Deliver as soon as the request is dispatched
    Immediate,
}

/// A code requested by the engine during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRequest {
    pub code: TriggerCode,
    pub timing: Timing,
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("marker device unavailable: {0}")]
    Unavailable(String),
    #[error("marker write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for marker codes (parallel port, network bridge, file, ...)
pub trait TriggerSink {
    fn emit(&mut self, code: TriggerCode, timestamp: f64) -> Result<(), TriggerError>;
}

/// Sink that only narrates (no marker hardware attached)
#[derive(Debug, Default)]
pub struct LogSink;

impl TriggerSink for LogSink {
    fn emit(&mut self, _code: TriggerCode, _timestamp: f64) -> Result<(), TriggerError> {
        Ok(())
    }
}

/// Sink writing a `time,code` marker timeline
#[derive(Debug)]
pub struct MarkerWriter<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> MarkerWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TriggerSink for MarkerWriter<W> {
    fn emit(&mut self, code: TriggerCode, timestamp: f64) -> Result<(), TriggerError> {
        if !self.header_written {
            writeln!(self.out, "time,code")?;
            self.header_written = true;
        }
        writeln!(self.out, "{:.4},{}", timestamp, code.code())?;
        self.out.flush()?;
        Ok(())
    }
}

/// In-memory sink keeping every delivered marker
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<(f64, TriggerCode)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, code: TriggerCode) -> usize {
        self.events.iter().filter(|(_, c)| *c == code).count()
    }

    pub fn first(&self, code: TriggerCode) -> Option<f64> {
        self.events.iter().find(|(_, c)| *c == code).map(|(t, _)| *t)
    }

    pub fn codes(&self) -> Vec<u8> {
        self.events.iter().map(|(_, c)| c.code()).collect()
    }
}

impl TriggerSink for RecordingSink {
    fn emit(&mut self, code: TriggerCode, timestamp: f64) -> Result<(), TriggerError> {
        self.events.push((timestamp, code));
        Ok(())
    }
}

/// Flip-synchronized, best-effort front end over a sink
#[derive(Debug)]
pub struct TriggerChannel<S: TriggerSink> {
    sink: S,
    pending: Vec<TriggerCode>,
    sent: u32,
    failed: u32,
}

impl<S: TriggerSink> TriggerChannel<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            pending: Vec::new(),
            sent: 0,
            failed: 0,
        }
    }

    /// Queue a code for the next flip
    pub fn call_on_flip(&mut self, code: TriggerCode) {
        self.pending.push(code);
    }

    /// Route an engine request by its timing
    pub fn dispatch(&mut self, request: TriggerRequest, now: f64) {
        match request.timing {
            Timing::OnFlip => self.call_on_flip(request.code),
            Timing::Immediate => {
                // Failure is already logged and counted
                let _ = self.emit_now(request.code, now);
            }
        }
    }

    /// Deliver everything queued, stamped with the flip time
    pub fn on_flip(&mut self, timestamp: f64) {
        for code in std::mem::take(&mut self.pending) {
            let _ = self.emit_now(code, timestamp);
        }
    }

    /// Send one code right away
    pub fn emit_now(&mut self, code: TriggerCode, timestamp: f64) -> Result<(), TriggerError> {
        match self.sink.emit(code, timestamp) {
            Ok(()) => {
                self.sent += 1;
                log::info!("TRIG {} sent at {:.2} sec", code.code(), timestamp);
                Ok(())
            }
            Err(e) => {
                self.failed += 1;
                log::error!("Failed to send trigger {} at {:.2} sec: {}", code.code(), timestamp, e);
                Err(e)
            }
        }
    }

    pub fn pending(&self) -> &[TriggerCode] {
        &self.pending
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
