//! Test to verify test infrastructure works correctly

mod common;

use common::builders::SessionBuilder;
use common::mock_helpers::stub_predictor;

#[test]
fn test_infrastructure_setup() {
    let dir = tempfile::tempdir().unwrap();
    let session = SessionBuilder::new(2, 2).ticks_at(&[0.0, 1.0]);
    let path = session.write(dir.path(), "take.json");
    assert!(path.is_file());
    assert_eq!(session.states().len(), 2);
    assert!(session.states()[0].matches(&session.header()).is_ok());
}

#[test]
fn test_stub_predictor() {
    let (predictor, seen) = stub_predictor(1, 3, 0.425);
    assert_eq!(predictor.predict(vec![0.0; 4]).unwrap(), 1);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}
