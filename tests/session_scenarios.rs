//! End-to-end session scenarios on the headless platform

use std::path::PathBuf;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use occlusion_task::consts::OBJECT_SPEED;
use occlusion_task::heading_to_unit;
use occlusion_task::platform::{HeadlessPlatform, Key};
use occlusion_task::sim::reappearance::{closest_heading, reselect_heading};
use occlusion_task::sim::{Arena, DeviationParams, TrialType};
use occlusion_task::trigger::{LogSink, RecordingSink, TriggerError};
use occlusion_task::{Session, SessionEnd, SessionPreset, Settings, TriggerCode, TriggerSink};

fn test_settings(seed: u64) -> Settings {
    let mut settings = Settings::from_preset(SessionPreset::Test);
    settings.seed = Some(seed);
    settings
}

fn disappearance_count(sink: &RecordingSink) -> usize {
    sink.count(TriggerCode::DisappearNormal) + sink.count(TriggerCode::DisappearCorner)
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("occlusion-{name}-{}", std::process::id()))
}

#[test]
fn first_disappearance_follows_baseline() {
    let platform = HeadlessPlatform::new(60.0).with_responder(Key::Left, 1.0);
    let report = Session::new(test_settings(11), platform, RecordingSink::new()).run();

    let baseline_end = report.sink.first(TriggerCode::BaselineEnd).unwrap();
    assert!(baseline_end > 30.0 && baseline_end < 30.1);

    let first_disappearance = report
        .sink
        .events
        .iter()
        .find(|(_, c)| matches!(c, TriggerCode::DisappearNormal | TriggerCode::DisappearCorner))
        .map(|(t, _)| *t)
        .unwrap();
    assert!(first_disappearance >= 34.0);
    assert!(first_disappearance <= 38.1);
}

#[test]
fn baseline_end_marker_once_even_when_skipped() {
    let platform = HeadlessPlatform::new(60.0)
        .press_at(5.0, Key::Space)
        .press_at(5.5, Key::Space)
        .press_at(40.0, Key::Space);
    let report = Session::new(test_settings(12), platform, RecordingSink::new()).run();

    assert_eq!(report.sink.count(TriggerCode::BaselineEnd), 1);
    let t = report.sink.first(TriggerCode::BaselineEnd).unwrap();
    assert!(t < 5.1);
}

#[test]
fn one_record_per_completed_cycle() {
    let platform = HeadlessPlatform::new(60.0).with_responder(Key::Down, 0.5);
    let report = Session::new(test_settings(13), platform, RecordingSink::new()).run();

    let disappearances = disappearance_count(&report.sink);
    assert!(disappearances >= 7);
    assert_eq!(report.recorder.len(), disappearances);

    let reappearances: usize = [
        TriggerCode::ReappearPredictable,
        TriggerCode::ReappearPredictableCorner,
        TriggerCode::ReappearUnpredictable,
        TriggerCode::ReappearUnpredictableCorner,
    ]
    .into_iter()
    .map(|c| report.sink.count(c))
    .sum();
    assert_eq!(reappearances, disappearances);

    for (i, record) in report.recorder.records().iter().enumerate() {
        assert_eq!(record.disappearance_number as usize, i + 1);
    }
    let first_block: Vec<_> = report.recorder.records()[..7]
        .iter()
        .map(|r| r.reappearance_type)
        .collect();
    assert_eq!(first_block[6], TrialType::Unpredictable);

    // Final sequence ran exactly once, with a single exit marker
    assert_eq!(report.sink.count(TriggerCode::FinalSequenceStart), 1);
    assert_eq!(report.sink.count(TriggerCode::BoundaryExit), 1);

    // Question answered once, paired with a clear marker
    assert_eq!(report.answers.len(), 1);
    assert_eq!(report.sink.count(TriggerCode::QuestionShown), 1);
    assert_eq!(report.sink.count(TriggerCode::QuestionCleared), 1);
}

#[test]
fn abort_still_sends_session_end_and_exports() {
    let platform = HeadlessPlatform::new(60.0).press_at(50.0, Key::Escape);
    let report = Session::new(test_settings(14), platform, RecordingSink::new()).run();

    assert_eq!(report.end, SessionEnd::Aborted);
    assert_eq!(report.sink.codes().last(), Some(&3));
    assert_eq!(report.sink.count(TriggerCode::QuestionShown), 0);

    let dir = temp_dir("abort");
    let path = report.export(&dir).unwrap();
    let csv = std::fs::read_to_string(&path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("disappearance_number,disappeared_in_corner,reappearance_type,reappeared_in_corner")
    );
    assert_eq!(lines.count(), report.recorder.len());
    let _ = std::fs::remove_dir_all(&dir);
}

struct FlakySink {
    calls: u32,
}

impl TriggerSink for FlakySink {
    fn emit(&mut self, _code: TriggerCode, _timestamp: f64) -> Result<(), TriggerError> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            Err(TriggerError::Unavailable("port busy".into()))
        } else {
            Ok(())
        }
    }
}

#[test]
fn failing_sink_never_stops_the_session() {
    let platform = HeadlessPlatform::new(60.0).with_responder(Key::Up, 0.5);
    let report = Session::new(test_settings(15), platform, FlakySink { calls: 0 }).run();

    assert_eq!(report.end, SessionEnd::Completed);
    assert!(report.triggers_failed > 0);
    assert_eq!(report.triggers_sent + report.triggers_failed, report.sink.calls);
    assert!(report.recorder.len() >= 7);
}

#[test]
fn same_seed_same_session() {
    let run = || {
        let platform = HeadlessPlatform::new(60.0).with_responder(Key::Right, 0.7);
        Session::new(test_settings(16), platform, RecordingSink::new()).run()
    };
    let a = run();
    let b = run();
    assert_eq!(a.sink.events, b.sink.events);
    assert_eq!(a.recorder.records(), b.recorder.records());
}

#[test]
fn log_sink_session_completes() {
    let report = Session::new(test_settings(17), HeadlessPlatform::new(60.0), LogSink).run();
    // Nobody answers: the question blocks the rest of the session
    assert_eq!(report.end, SessionEnd::Completed);
    assert!(report.answers.is_empty());
    assert_eq!(report.triggers_failed, 0);
}

#[test]
fn heading_change_leaves_closest_diagonal() {
    let params = DeviationParams::default();
    let vel = heading_to_unit(-60.0) * OBJECT_SPEED;
    assert_eq!(closest_heading(vel, &params.headings_deg), Some(-60.0));

    let mut rng = Pcg32::seed_from_u64(2);
    for _ in 0..100 {
        let heading = reselect_heading(vel, &params.headings_deg, &mut rng).unwrap();
        assert!([60.0, 120.0, -120.0].contains(&heading));
    }
}

#[test]
fn malformed_geometry_runs_on_default_arena() {
    let mut settings = test_settings(18);
    settings.arena.corner_zones[0].x_min = settings.arena.corner_zones[0].x_max + 0.5;
    let platform = HeadlessPlatform::new(60.0).press_at(10.0, Key::Escape);
    let session = Session::new(settings, platform, RecordingSink::new());
    assert_eq!(session.state().arena, Arena::default());
    assert!(session.state().arena.contains(Vec2::ZERO));
    let report = session.run();
    assert_eq!(report.end, SessionEnd::Aborted);
}
