//! Integration tests for the playback modes
//!
//! These tests drive the director end to end:
//! - Prediction with a stub classifier and with the bundled models
//! - Label authoring followed by label-driven replay
//! - Random cuts
//! - Teardown on corrupt records

mod common;

use std::path::{Path, PathBuf};

use camdirector::scene::SceneAdapter;
use camdirector::session::format::{label_path_for, read_labels};
use camdirector::session::DirectorEvent;
use camdirector::{DirectorConfig, DirectorState, HeadlessScene, ModelKind, SessionDirector};
use common::builders::SessionBuilder;
use common::mock_helpers::stub_predictor;
use common::{assert_float_eq, drain, run_to_end};

fn director() -> SessionDirector<HeadlessScene> {
    SessionDirector::new(HeadlessScene::new(), DirectorConfig::default())
}

fn models_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models")
}

#[test]
fn test_predict_three_tick_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = SessionBuilder::new(2, 2)
        .ticks_at(&[0.0, 1.0, 2.0])
        .write(dir.path(), "take.json");

    let (predictor, seen) = stub_predictor(1, 2, 0.425);
    let mut director = director().with_predictor(predictor);
    assert!(director.start_predict(&path).unwrap());

    for _ in 0..3 {
        director.tick().unwrap();
    }
    assert_eq!(director.scene().current_camera(), 1);

    let rows = seen.lock().unwrap();
    let last = rows.last().unwrap();
    assert_float_eq(last[1], 1.0, 1e-9);
    drop(rows);

    director.tick().unwrap();
    assert_eq!(director.state(), DirectorState::Inactive);
}

#[test]
fn test_feature_row_sentinels_before_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = SessionBuilder::new(2, 2)
        .ticks_at(&[0.0, 1.0])
        .write(dir.path(), "take.json");

    let (predictor, seen) = stub_predictor(0, 2, 0.425);
    let mut director = director().with_predictor(predictor);
    director.start_predict(&path).unwrap();
    run_to_end(&mut director);

    let rows = seen.lock().unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.len(), 137);
    // Tick 2 predicts before any observation: every statistic is a sentinel
    assert_float_eq(row[0], 1.0, 1e-9);
    assert_eq!(row[1], 0.0);
    assert_eq!(row[2], 0.0);
    assert_eq!(row[5], -1.0);
    assert_eq!(row[6], 0.0);
    assert_eq!(row[71], -1.0);
}

#[test]
fn test_label_then_replay() {
    let dir = tempfile::tempdir().unwrap();
    let path = SessionBuilder::new(3, 2)
        .ticks_at(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
        .write(dir.path(), "take.json");

    let mut director = director();
    assert!(director.start_write_label(&path).unwrap());
    let mut ticks = 0;
    while !director.state().is_inactive() {
        match director.data_index() {
            3 => assert!(director.scene_mut().switch_camera(2)),
            5 => assert!(director.scene_mut().switch_camera(1)),
            _ => {}
        }
        director.tick().unwrap();
        ticks += 1;
    }
    assert_eq!(ticks, 7);

    let label_path = label_path_for(&path);
    let labels = read_labels(&label_path).unwrap();
    assert_eq!(labels.list, vec![0, 0, 2, 2, 1, 1]);

    let events = director.subscribe();
    assert!(director.start_replay(&label_path).unwrap());
    run_to_end(&mut director);
    assert_eq!(director.scene().cuts(), &[2, 1]);

    let switched: Vec<usize> = drain(&events)
        .into_iter()
        .filter_map(|e| match e {
            DirectorEvent::CameraSwitched { camera } => Some(camera),
            _ => None,
        })
        .collect();
    assert_eq!(switched, vec![2, 1]);
}

#[test]
fn test_bundled_models_drive_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let times: Vec<f32> = (0..40).map(|i| i as f32).collect();
    let path = SessionBuilder::new(3, 2)
        .ticks_at(&times)
        .write(dir.path(), "take.json");

    for kind in [ModelKind::Researcher, ModelKind::Expert] {
        let mut config = DirectorConfig::default();
        config.prediction.models_dir = models_dir();
        let mut director = SessionDirector::new(HeadlessScene::new(), config);
        assert!(director.change_model(kind).unwrap());
        assert!(director.start_predict(&path).unwrap());
        assert_eq!(run_to_end(&mut director), 41);
        assert!(director.scene().cuts().iter().all(|&c| c < 3));
    }
}

#[test]
fn test_random_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let times: Vec<f32> = (0..500).map(|i| i as f32).collect();
    let path = SessionBuilder::new(4, 1)
        .ticks_at(&times)
        .write(dir.path(), "take.json");

    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut director = director();
        director.start_random(&path).unwrap();
        run_to_end(&mut director);
        let cuts = director.scene().cuts().to_vec();
        assert!(!cuts.is_empty());
        assert!(cuts.windows(2).all(|w| w[0] != w[1]));
        runs.push(cuts);
    }
    assert_eq!(runs[0], runs[1]);
}

#[test]
fn test_one_session_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = SessionBuilder::new(2, 1)
        .ticks_at(&[0.0, 1.0])
        .write(dir.path(), "take.json");

    let (predictor, _) = stub_predictor(1, 2, 0.425);
    let mut director = director().with_predictor(predictor);
    assert!(director.start_random(&path).unwrap());
    director.pause();
    assert!(!director.start_predict(&path).unwrap());
    assert!(!director.start_replay(&path).unwrap());
    assert_eq!(director.state(), DirectorState::PausedRandom);

    director.stop().unwrap();
    assert!(director.start_predict(&path).unwrap());
}

#[test]
fn test_corrupt_record_mid_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = SessionBuilder::new(2, 1)
        .ticks_at(&[0.0, 1.0, 2.0])
        .write(dir.path(), "take.json");
    let text = std::fs::read_to_string(&path).unwrap();
    let mut records: Vec<&str> = text.split('|').collect();
    records[2] = "{\"timeElapsed\":1.0}";
    std::fs::write(&path, records.join("|")).unwrap();

    let mut director = director();
    let events = director.subscribe();
    director.start_write_label(&path).unwrap();
    director.tick().unwrap();
    assert!(director.tick().is_err());
    assert!(director.state().is_inactive());
    assert_eq!(director.scene().replay_camera_count(), 0);

    // The labels authored before the failure are still written
    let labels = read_labels(&label_path_for(&path)).unwrap();
    assert_eq!(labels.list, vec![0, 0, -1]);
    assert!(drain(&events)
        .iter()
        .any(|e| matches!(e, DirectorEvent::LabelsWritten { .. })));
}
