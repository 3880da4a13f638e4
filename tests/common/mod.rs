//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use camdirector::session::DirectorEvent;
use camdirector::{HeadlessScene, SessionDirector};
use crossbeam_channel::Receiver;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Tick until the director goes inactive; returns the number of ticks run
pub fn run_to_end(director: &mut SessionDirector<HeadlessScene>) -> usize {
    let mut ticks = 0;
    while !director.state().is_inactive() {
        director.tick().expect("tick failed");
        ticks += 1;
        assert!(ticks < 100_000, "session never ended");
    }
    ticks
}

/// Drain every pending event
pub fn drain(events: &Receiver<DirectorEvent>) -> Vec<DirectorEvent> {
    events.try_iter().collect()
}
