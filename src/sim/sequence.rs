//! Balanced trial-type sequence
//!
//! One element is consumed per disappearance cycle. The first block of a
//! session is all predictable with the single unpredictable trial last;
//! every regenerated block is a fixed predictable lead followed by a
//! shuffled tail containing exactly one unpredictable trial. Each block has
//! the same composition, only the order varies.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::consts::{SEQUENCE_LEAD_PREDICTABLE, SEQUENCE_TAIL_PREDICTABLE};

/// Which reappearance strategy governs a disappearance cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialType {
    Predictable,
    Unpredictable,
}

impl TrialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialType::Predictable => "predictable",
            TrialType::Unpredictable => "unpredictable",
        }
    }
}

/// Sequence composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceLayout {
    /// Predictable trials that always open a regenerated block
    pub lead_predictable: usize,
    /// Predictable trials shuffled together with the unpredictable one
    pub tail_predictable: usize,
}

impl Default for SequenceLayout {
    fn default() -> Self {
        Self {
            lead_predictable: SEQUENCE_LEAD_PREDICTABLE,
            tail_predictable: SEQUENCE_TAIL_PREDICTABLE,
        }
    }
}

impl SequenceLayout {
    /// Trials per block
    pub fn block_len(&self) -> usize {
        self.lead_predictable + self.tail_predictable + 1
    }

    /// Opening block: every predictable trial first, the unpredictable one last
    pub fn initial(&self) -> Vec<TrialType> {
        let mut trials = vec![TrialType::Predictable; self.block_len() - 1];
        trials.push(TrialType::Unpredictable);
        trials
    }

    /// Fresh block: predictable lead plus a shuffled tail
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Vec<TrialType> {
        let mut trials = vec![TrialType::Predictable; self.lead_predictable];

        let mut tail = vec![TrialType::Predictable; self.tail_predictable];
        tail.push(TrialType::Unpredictable);
        tail.shuffle(rng);

        trials.extend(tail);
        trials
    }
}

/// Cursor over the current block, regenerated on exhaustion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSequence {
    layout: SequenceLayout,
    trials: Vec<TrialType>,
    cursor: usize,
    /// Number of blocks generated so far (the opening block counts)
    blocks: u32,
}

impl TrialSequence {
    pub fn new(layout: SequenceLayout) -> Self {
        Self {
            layout,
            trials: layout.initial(),
            cursor: 0,
            blocks: 1,
        }
    }

    /// Trial type for the upcoming cycle
    pub fn current(&self) -> TrialType {
        self.trials
            .get(self.cursor)
            .copied()
            .unwrap_or(TrialType::Predictable)
    }

    /// Move past the current trial, regenerating the block when exhausted
    pub fn advance<R: Rng>(&mut self, rng: &mut R) {
        self.cursor += 1;
        if self.cursor >= self.trials.len() {
            self.trials = self.layout.generate(rng);
            self.cursor = 0;
            self.blocks += 1;
            log::debug!("Trial block {} generated: {:?}", self.blocks, self.trials);
        }
    }

    pub fn trials(&self) -> &[TrialType] {
        &self.trials
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn blocks(&self) -> u32 {
        self.blocks
    }
}
