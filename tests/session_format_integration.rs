//! Integration tests for the session file format
//!
//! These tests validate reading back what the writer produced:
//! - Field-for-field tick round trip
//! - Label files paired with their data file
//! - The recorder writing a live scene

mod common;

use camdirector::scene::HeadlessScene;
use camdirector::session::format::{label_path_for, read_labels};
use camdirector::session::types::LabelList;
use camdirector::session::{SessionFile, SessionRecorder};
use camdirector::DirectorError;
use common::builders::{SessionBuilder, StateBuilder};
use proptest::prelude::*;

#[test]
fn test_round_trip_preserves_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let session = SessionBuilder::new(3, 2)
        .interval(0.5)
        .ticks_at(&[0.0, 0.5, 1.0, 1.5]);
    let path = session.write(dir.path(), "take.json");

    let file = SessionFile::open(&path, '|').unwrap();
    assert_eq!(file.header(), &session.header());
    assert_eq!(file.tick_count(), session.states().len());
    for (i, expected) in session.states().iter().enumerate() {
        assert_eq!(&file.tick(i + 1).unwrap(), expected);
    }
    assert!(file.labels().is_none());
}

#[test]
fn test_label_file_in_labels_directory() {
    let root = tempfile::tempdir().unwrap();
    let data_dir = root.path().join("Data");
    let label_dir = root.path().join("Labels");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::create_dir_all(&label_dir).unwrap();

    let path = SessionBuilder::new(2, 1)
        .ticks_at(&[0.0, 1.0, 2.0])
        .write(&data_dir, "take.json");
    let label_path = label_dir.join(label_path_for(&path).file_name().unwrap());
    std::fs::write(&label_path, r#"{"list":[0,1,1]}"#).unwrap();

    let file = SessionFile::open(&label_path, '|').unwrap();
    assert_eq!(
        file.data_path().canonicalize().unwrap(),
        path.canonicalize().unwrap()
    );
    assert_eq!(file.tick_count(), 3);
    assert_eq!(file.label(2), Some(1));
    assert_eq!(read_labels(&label_path).unwrap(), LabelList { list: vec![0, 1, 1] });
}

#[test]
fn test_short_label_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = SessionBuilder::new(2, 1)
        .ticks_at(&[0.0, 1.0, 2.0])
        .write(dir.path(), "take.json");
    let label_path = label_path_for(&path);
    std::fs::write(&label_path, r#"{"list":[0]}"#).unwrap();

    assert!(matches!(
        SessionFile::open(&label_path, '|'),
        Err(DirectorError::LabelMismatch { labels: 1, ticks: 3 })
    ));
}

#[test]
fn test_recorder_output_replays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live.json");
    let mut scene = HeadlessScene::demo();
    let mut recorder = SessionRecorder::start(&scene, &path, '|', 1.0).unwrap();
    for _ in 0..5 {
        scene.advance(1.0);
        scene.animate();
        recorder.sample(&scene).unwrap();
    }
    recorder.stop().unwrap();

    let file = SessionFile::open(&path, '|').unwrap();
    assert_eq!(file.tick_count(), 5);
    let times: Vec<f32> = (1..=5).map(|i| file.tick(i).unwrap().time_elapsed).collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_custom_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("take.json");
    let session = SessionBuilder::new(1, 1).ticks_at(&[0.0, 1.0]);
    let mut writer = camdirector::session::SessionWriter::create(&path, '#').unwrap();
    writer.write_header(&session.header()).unwrap();
    for state in session.states() {
        writer.append_tick(state).unwrap();
    }
    writer.close().unwrap();

    assert_eq!(SessionFile::open(&path, '#').unwrap().tick_count(), 2);
    assert!(SessionFile::open(&path, '|').is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_round_trip(
        voices in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0), 0..20),
        cameras in 1usize..4,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        let states: Vec<_> = voices
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                StateBuilder::new(i as f32 * 0.25)
                    .cameras(cameras)
                    .avatar(-1.0, *a)
                    .avatar(1.0, *b)
                    .build()
            })
            .collect();

        let mut writer = camdirector::session::SessionWriter::create(&path, '|').unwrap();
        writer
            .write_header(&camdirector::session::EnvironmentData::new(0.25, cameras, 2))
            .unwrap();
        for state in &states {
            writer.append_tick(state).unwrap();
        }
        writer.close().unwrap();

        let file = SessionFile::open(&path, '|').unwrap();
        prop_assert_eq!(file.tick_count(), states.len());
        for (i, state) in states.iter().enumerate() {
            prop_assert_eq!(&file.tick(i + 1).unwrap(), state);
        }
    }
}
