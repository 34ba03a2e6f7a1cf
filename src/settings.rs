//! Session settings
//!
//! Loaded from a JSON file; any field left out keeps its preset default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::sim::arena::Arena;
use crate::sim::reappearance::DeviationParams;
use crate::sim::sequence::SequenceLayout;

/// Effective settings written next to the session output
pub const SETTINGS_FILE: &str = "settings.json";

/// Session length presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    /// 15 minute session, questions every 3 minutes
    #[default]
    Full,
    /// 2 minute session with a single question, for piloting
    Test,
}

impl SessionPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPreset::Full => "full",
            SessionPreset::Test => "test",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full" => Some(SessionPreset::Full),
            "test" | "pilot" => Some(SessionPreset::Test),
            _ => None,
        }
    }

    /// Total session length (seconds)
    pub fn total_duration(&self) -> f64 {
        match self {
            SessionPreset::Full => 15.0 * 60.0,
            SessionPreset::Test => 2.0 * 60.0,
        }
    }

    /// Question offsets from session start (seconds)
    pub fn question_times(&self) -> Vec<f64> {
        match self {
            SessionPreset::Full => vec![3.0 * 60.0, 6.0 * 60.0, 9.0 * 60.0, 12.0 * 60.0],
            SessionPreset::Test => vec![60.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub preset: SessionPreset,

    // === Timing (seconds) ===
    pub total_duration: f64,
    pub baseline_duration: f64,
    pub invisible_duration: f64,
    pub min_disappearance_interval: f64,
    pub max_disappearance_interval: f64,
    pub question_times: Vec<f64>,
    pub question_tolerance: f64,
    pub final_window: f64,
    pub final_delay: f64,

    // === Motion ===
    /// Object speed (units per second)
    pub speed: f32,
    pub arena: Arena,
    pub deviation: DeviationParams,
    pub final_inner_margin: f32,
    pub final_outer_margin: f32,

    // === Trials ===
    pub sequence: SequenceLayout,

    // === Run ===
    /// RNG seed; a random one is drawn (and logged) when absent
    pub seed: Option<u64>,
    /// Display refresh rate used by the headless platform
    pub frame_rate: f64,
    /// Where trial data, markers and the session log go
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_preset(SessionPreset::Full)
    }
}

impl Settings {
    /// Settings with the preset's durations and question schedule
    pub fn from_preset(preset: SessionPreset) -> Self {
        Self {
            preset,

            total_duration: preset.total_duration(),
            baseline_duration: BASELINE_DURATION,
            invisible_duration: INVISIBLE_DURATION,
            min_disappearance_interval: MIN_DISAPPEARANCE_INTERVAL,
            max_disappearance_interval: MAX_DISAPPEARANCE_INTERVAL,
            question_times: preset.question_times(),
            question_tolerance: QUESTION_TOLERANCE,
            final_window: FINAL_WINDOW,
            final_delay: FINAL_DELAY,

            speed: OBJECT_SPEED,
            arena: Arena::default(),
            deviation: DeviationParams::default(),
            final_inner_margin: FINAL_INNER_MARGIN,
            final_outer_margin: FINAL_OUTER_MARGIN,

            sequence: SequenceLayout::default(),

            seed: None,
            frame_rate: FRAME_RATE,
            output_dir: PathBuf::from("output"),
        }
    }

    /// Switch preset, replacing the preset-dependent durations
    pub fn apply_preset(&mut self, preset: SessionPreset) {
        self.preset = preset;
        self.total_duration = preset.total_duration();
        self.question_times = preset.question_times();
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Reject settings the scheduler cannot run.
    ///
    /// Arena geometry is not checked here: the engine logs malformed
    /// geometry and falls back to the default arena.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("total_duration", self.total_duration),
            ("invisible_duration", self.invisible_duration),
            ("min_disappearance_interval", self.min_disappearance_interval),
            ("final_delay", self.final_delay),
            ("frame_rate", self.frame_rate),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(Error::Settings(format!("{name} must be positive (got {value})")));
            }
        }
        if self.baseline_duration < 0.0 || self.final_window < 0.0 || self.question_tolerance < 0.0 {
            return Err(Error::Settings(
                "baseline_duration, final_window and question_tolerance must not be negative".into(),
            ));
        }
        if self.max_disappearance_interval < self.min_disappearance_interval {
            return Err(Error::Settings(format!(
                "disappearance interval is empty ({} > {})",
                self.min_disappearance_interval, self.max_disappearance_interval
            )));
        }
        if let Some(t) = self
            .question_times
            .iter()
            .find(|t| **t < 0.0 || **t > self.total_duration)
        {
            return Err(Error::Settings(format!(
                "question time {t} is outside the session (0..{})",
                self.total_duration
            )));
        }
        if !(self.speed > 0.0) {
            return Err(Error::Settings("speed must be positive".into()));
        }
        if self.deviation.headings_deg.len() < 2 {
            return Err(Error::Settings("at least two headings are required".into()));
        }
        if self.deviation.angles_deg.is_empty() {
            return Err(Error::Settings("no deviation angles configured".into()));
        }
        if self.final_outer_margin <= self.final_inner_margin {
            return Err(Error::Settings(
                "final_outer_margin must exceed final_inner_margin".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let full = Settings::from_preset(SessionPreset::Full);
        assert_eq!(full.total_duration, 900.0);
        assert_eq!(full.question_times, vec![180.0, 360.0, 540.0, 720.0]);

        let test = Settings::from_preset(SessionPreset::Test);
        assert_eq!(test.total_duration, 120.0);
        assert_eq!(test.question_times, vec![60.0]);
        assert_eq!(test.baseline_duration, 30.0);

        assert!(full.validate().is_ok());
        assert!(test.validate().is_ok());
    }

    #[test]
    fn test_apply_preset() {
        let mut s = Settings::default();
        s.apply_preset(SessionPreset::Test);
        assert_eq!(s.preset, SessionPreset::Test);
        assert_eq!(s.total_duration, 120.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{ "baseline_duration": 5.0, "seed": 9 }"#).unwrap();
        assert_eq!(s.baseline_duration, 5.0);
        assert_eq!(s.seed, Some(9));
        assert_eq!(s.invisible_duration, INVISIBLE_DURATION);
        assert_eq!(s.arena, Arena::default());
    }

    #[test]
    fn test_json_round_trip() {
        let s = Settings::from_preset(SessionPreset::Test);
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_save_then_load() {
        let mut s = Settings::from_preset(SessionPreset::Test);
        s.seed = Some(77);
        s.speed = 0.3;
        let path = std::env::temp_dir().join(format!("occlusion-settings-{}.json", std::process::id()));
        s.save(&path).unwrap();
        let back = Settings::load(&path).unwrap();
        assert_eq!(back, s);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut s = Settings::default();
        s.max_disappearance_interval = 2.0;
        assert!(matches!(s.validate(), Err(Error::Settings(_))));

        let mut s = Settings::default();
        s.question_times.push(1000.0);
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.deviation.headings_deg = vec![60.0];
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.frame_rate = 0.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!(SessionPreset::from_str("TEST"), Some(SessionPreset::Test));
        assert_eq!(SessionPreset::from_str("pilot"), Some(SessionPreset::Test));
        assert_eq!(SessionPreset::from_str("long"), None);
        assert_eq!(SessionPreset::Full.as_str(), "full");
    }
}
