//! Deterministic simulation module
//!
//! All session logic lives here. This module must be pure and deterministic:
//! - Session clock supplied by the caller
//! - Seeded RNG only
//! - No rendering or platform I/O (triggers are queued, not sent)

pub mod arena;
pub mod motion;
pub mod reappearance;
pub mod sequence;
pub mod state;
pub mod tick;

pub use arena::{Arena, Corner, CornerZone, GeometryError, Wall};
pub use motion::{MotionState, integrate};
pub use reappearance::{DeviationParams, Reappearance};
pub use sequence::{SequenceLayout, TrialSequence, TrialType};
pub use state::{CycleStage, EngineState, FinalStage, Phase, QuestionOutcome};
pub use tick::{TickInput, TickOutcome, tick};
