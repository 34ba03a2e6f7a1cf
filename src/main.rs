//! Occlusion Task entry point
//!
//! Runs one session against the headless platform with a simulated
//! participant and writes trial data, markers and the session log.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use occlusion_task::logging::{self, SESSION_LOG_FILE};
use occlusion_task::platform::{HeadlessPlatform, Key};
use occlusion_task::settings::SETTINGS_FILE;
use occlusion_task::trigger::{MARKERS_FILE, MarkerWriter};
use occlusion_task::{Result, Session, SessionPreset, Settings};

/// Reaction time of the simulated participant (seconds)
const RESPONDER_DELAY: f64 = 1.2;

#[derive(Parser, Debug)]
#[command(name = "occlusion-task")]
#[command(about = "Bouncing-object occlusion session with event markers", long_about = None)]
#[command(version)]
struct Args {
    /// Two-minute pilot session (same as --preset test)
    #[arg(long, conflicts_with = "preset")]
    test: bool,

    /// Session preset (full, test)
    #[arg(long, value_parser = parse_preset)]
    preset: Option<SessionPreset>,

    /// Settings JSON file; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed (random and logged when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for trial data, markers and the session log
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Arrow key the simulated participant answers with
    #[arg(long, value_enum, default_value_t = Answer::Left)]
    answer: Answer,

    /// Press escape at this session time (seconds)
    #[arg(long)]
    escape_at: Option<f64>,
}

impl Args {
    fn preset(&self) -> Option<SessionPreset> {
        if self.test {
            Some(SessionPreset::Test)
        } else {
            self.preset
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Answer {
    Up,
    Down,
    Left,
    Right,
}

impl From<Answer> for Key {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Up => Key::Up,
            Answer::Down => Key::Down,
            Answer::Left => Key::Left,
            Answer::Right => Key::Right,
        }
    }
}

fn parse_preset(s: &str) -> std::result::Result<SessionPreset, String> {
    SessionPreset::from_str(s).ok_or_else(|| format!("unknown preset '{s}' (expected full or test)"))
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(preset) = args.preset() {
        settings.apply_preset(preset);
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if let Some(out) = &args.out {
        settings.output_dir = out.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn run() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;
    let out_dir = settings.output_dir.clone();

    fs::create_dir_all(&out_dir)?;
    let log_path = out_dir.join(SESSION_LOG_FILE);
    logging::init(Some(log_path.as_path()))?;
    log::info!("=== Experiment Log ===");
    log::info!("Preset: {}, output: {}", settings.preset.as_str(), out_dir.display());
    if let Err(e) = settings.save(&out_dir.join(SETTINGS_FILE)) {
        log::warn!("Could not save settings: {}", e);
    }

    let markers = File::create(out_dir.join(MARKERS_FILE))?;
    let mut platform = HeadlessPlatform::new(settings.frame_rate)
        .with_responder(args.answer.into(), RESPONDER_DELAY);
    if let Some(at) = args.escape_at {
        platform = platform.press_at(at, Key::Escape);
    }

    let report = Session::new(settings, platform, MarkerWriter::new(BufWriter::new(markers))).run();

    match report.export(&out_dir).and_then(|_| report.recorder.save_json(&out_dir)) {
        Ok(_) => log::info!("Wrote {} record(s) to {}", report.recorder.len(), out_dir.display()),
        Err(e) => {
            log::error!("Export failed: {}", e);
            eprintln!(
                "Could not save trial data ({e}). {} record(s) were collected; check that the output directory is writable.",
                report.recorder.len()
            );
        }
    }

    log::info!(
        "Session {} (seed {}), {}/{} answer(s) correct",
        report.end.as_str(),
        report.seed,
        report.correct_answers(),
        report.answers.len()
    );
    log::info!("=== Experiment End ===");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("occlusion-task: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let args = Args::try_parse_from([
            "occlusion-task",
            "--test",
            "--seed",
            "42",
            "--out",
            "run1",
            "--answer",
            "right",
            "--escape-at",
            "30.5",
        ])
        .unwrap();
        assert_eq!(args.preset(), Some(SessionPreset::Test));
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.out, Some(PathBuf::from("run1")));
        assert_eq!(Key::from(args.answer), Key::Right);
        assert_eq!(args.escape_at, Some(30.5));

        let settings = load_settings(&args).unwrap();
        assert_eq!(settings.total_duration, 120.0);
        assert_eq!(settings.seed, Some(42));
    }

    #[test]
    fn test_cli_defaults_and_rejections() {
        let args = Args::try_parse_from(["occlusion-task"]).unwrap();
        assert_eq!(args.preset(), None);
        assert_eq!(Key::from(args.answer), Key::Left);

        let args = Args::try_parse_from(["occlusion-task", "--preset", "pilot"]).unwrap();
        assert_eq!(args.preset(), Some(SessionPreset::Test));

        assert!(Args::try_parse_from(["occlusion-task", "--preset", "long"]).is_err());
        assert!(Args::try_parse_from(["occlusion-task", "--answer", "space"]).is_err());
        assert!(Args::try_parse_from(["occlusion-task", "--seed", "abc"]).is_err());
        assert!(Args::try_parse_from(["occlusion-task", "--test", "--preset", "full"]).is_err());
    }
}
