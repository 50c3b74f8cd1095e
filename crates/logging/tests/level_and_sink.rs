//! Integration tests for trace level filtering and sink replacement.
//!
//! The level and sink are process-wide, so every test that touches them
//! serialises on a shared lock and restores the defaults before releasing it.

use std::sync::{Mutex, MutexGuard};

use logging::{TraceLevel, enabled, level, log_debug, log_info, set_level, set_sink, stderr_sink};

static CONFIG_LOCK: Mutex<()> = Mutex::new(());

static CAPTURED: Mutex<Vec<(TraceLevel, String)>> = Mutex::new(Vec::new());

fn capture_sink(level: TraceLevel, msg: &str) {
    CAPTURED.lock().unwrap().push((level, msg.to_owned()));
}

fn configured(level: TraceLevel) -> MutexGuard<'static, ()> {
    let guard = CONFIG_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    CAPTURED.lock().unwrap().clear();
    set_sink(capture_sink);
    set_level(level);
    guard
}

fn restore(guard: MutexGuard<'static, ()>) {
    set_sink(stderr_sink);
    set_level(TraceLevel::Info);
    drop(guard);
}

#[test]
fn default_level_is_info() {
    let guard = CONFIG_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    set_level(TraceLevel::Info);
    assert_eq!(level(), TraceLevel::Info);
    assert!(enabled(TraceLevel::Warning));
    assert!(enabled(TraceLevel::Info));
    assert!(!enabled(TraceLevel::Debug));
    drop(guard);
}

#[test]
fn messages_below_threshold_are_dropped() {
    let guard = configured(TraceLevel::Info);

    log_info!("kept {}", 1);
    log_debug!("dropped {}", 2);

    let captured = CAPTURED.lock().unwrap().clone();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0], (TraceLevel::Info, "kept 1".to_owned()));

    restore(guard);
}

#[test]
fn raising_the_level_admits_debug_output() {
    let guard = configured(TraceLevel::Trace);

    log_debug!("block {} matched", 7);

    let captured = CAPTURED.lock().unwrap().clone();
    assert_eq!(captured, vec![(TraceLevel::Debug, "block 7 matched".to_owned())]);

    restore(guard);
}

#[test]
fn formatting_is_skipped_when_filtered() {
    struct PanicOnFormat;

    impl std::fmt::Display for PanicOnFormat {
        fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            panic!("formatted a filtered message");
        }
    }

    let guard = configured(TraceLevel::Error);
    log_info!("{}", PanicOnFormat);
    assert!(CAPTURED.lock().unwrap().is_empty());
    restore(guard);
}
