//! Integration tests for `weavelink_common::time`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use weavelink_common::time::{Clock, MockClock, SystemClock};

/// Validates that a mock clock advanced on one thread is observed on another.
///
/// Assertions:
/// - Confirms the observer sees the accumulated advance.
#[test]
fn mock_clock_is_shared_across_threads() {
    let clock = MockClock::at_epoch_seconds(1_700_000_000);
    let worker_clock = clock.clone();

    let worker = thread::spawn(move || {
        for _ in 0..10 {
            worker_clock.advance(Duration::from_secs(2));
        }
    });
    worker.join().unwrap();

    assert_eq!(clock.epoch_seconds(), 1_700_000_020);
}

#[test]
fn clocks_are_usable_as_trait_objects() {
    let clocks: Vec<Arc<dyn Clock>> =
        vec![Arc::new(SystemClock), Arc::new(MockClock::at_epoch_seconds(7))];

    assert!(clocks[0].epoch_seconds() > 0);
    assert_eq!(clocks[1].epoch_seconds(), 7);
}
