#![cfg(unix)]

mod common;
use crate::common::recorder::FiringRecorder;
use crate::common::{init_tracing, with_timeout};

use std::io;
use std::time::Duration;

use nix::sys::signal::{Signal, raise};
use tokio::time::sleep;

use tripline::action::TriggeredAction;
use tripline::errors::TriplineError;
use tripline::trigger::Phase;
use tripline::types::SignalId;

// Each test owns a distinct signal: they share one process and run in
// parallel.

async fn wait_for_count(recorder: &FiringRecorder, expected: usize) {
    with_timeout(async {
        while recorder.count() < expected {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn fires_once_per_delivered_signal_and_stops_after_end() {
    init_tracing();
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("usr1", recorder.callback())
        .to_writer(io::sink())
        .on_signals([SignalId::User1]);
    action.start().unwrap();
    assert_eq!(action.signal_trigger().phase(), Phase::Running);

    raise(Signal::SIGUSR1).unwrap();
    wait_for_count(&recorder, 1).await;

    raise(Signal::SIGUSR1).unwrap();
    wait_for_count(&recorder, 2).await;

    with_timeout(action.end()).await;
    assert_eq!(action.signal_trigger().phase(), Phase::Finished);

    // The handler stays installed for the process, so this is swallowed.
    raise(Signal::SIGUSR1).unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(recorder.count(), 2);
}

#[tokio::test]
async fn listens_to_every_signal_in_the_set() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("usr2-or-winch", recorder.callback())
        .to_writer(io::sink())
        .on_signals([SignalId::User2, SignalId::WindowChange, SignalId::User2]);
    assert_eq!(
        action.signal_trigger().signals(),
        &[SignalId::User2, SignalId::WindowChange]
    );
    action.start().unwrap();

    raise(Signal::SIGUSR2).unwrap();
    wait_for_count(&recorder, 1).await;

    raise(Signal::SIGWINCH).unwrap();
    wait_for_count(&recorder, 2).await;

    with_timeout(action.end()).await;
}

#[tokio::test]
async fn signals_and_schedule_drive_the_same_callback() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("both", recorder.callback())
        .to_writer(io::sink())
        .after(Duration::from_millis(10))
        .on_signals([SignalId::Hangup]);
    action.start().unwrap();

    wait_for_count(&recorder, 1).await;
    raise(Signal::SIGHUP).unwrap();
    wait_for_count(&recorder, 2).await;

    with_timeout(action.end()).await;
}

#[tokio::test]
async fn empty_signal_set_is_inert() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("no-signals", recorder.callback())
        .to_writer(io::sink())
        .on_signals(Vec::<SignalId>::new());
    assert!(action.signal_trigger().is_inert());
    action.start().unwrap();

    with_timeout(action.signal_trigger().wait_finished()).await;
    assert_eq!(recorder.count(), 0);
    with_timeout(action.end()).await;
}

#[tokio::test]
async fn forbidden_signal_is_a_registration_error() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("kill", recorder.callback())
        .to_writer(io::sink())
        .every(Duration::from_millis(10))
        .on_signals([SignalId::Raw(9)]);

    let err = action.start().unwrap_err();
    match &err {
        TriplineError::SignalRegistration { signal, .. } => {
            assert_eq!(*signal, SignalId::Raw(9));
        }
        other => panic!("expected SignalRegistration, got {other:?}"),
    }
    assert!(err.is_config_error());

    // Nothing was spawned, and ending still returns.
    assert_eq!(action.time_trigger().phase(), Phase::Idle);
    with_timeout(action.end()).await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(recorder.count(), 0);
}
