mod common;
use crate::common::recorder::FiringRecorder;
use crate::common::{init_tracing, with_timeout};

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{Instant, sleep};

use tripline::action::{Output, TriggeredAction};
use tripline::trigger::{Handshake, Phase};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn handshake_moves_through_its_phases() {
    let handshake = Handshake::new();
    assert_eq!(handshake.phase(), Phase::Idle);

    let guard = handshake.begin().expect("idle handshake hands out a guard");
    assert_eq!(handshake.phase(), Phase::Running);
    assert!(!guard.is_stop_requested());

    handshake.request_stop();
    assert_eq!(handshake.phase(), Phase::Stopping);
    assert!(guard.is_stop_requested());

    guard.report_completion();
    assert_eq!(handshake.phase(), Phase::Finished);

    // A finished slot never hands out a second guard.
    assert!(handshake.begin().is_none());
}

#[tokio::test]
async fn stopping_an_idle_handshake_finishes_it() {
    let handshake = Handshake::new();

    with_timeout(handshake.request_stop_and_wait()).await;
    assert_eq!(handshake.phase(), Phase::Finished);
    assert!(handshake.begin().is_none());
}

#[tokio::test]
async fn stop_and_wait_returns_once_the_worker_exits() {
    let handshake = Handshake::new();
    let mut guard = handshake.begin().unwrap();

    let worker = tokio::spawn(async move {
        guard.stop_requested().await;
        sleep(ms(20)).await;
    });

    with_timeout(handshake.request_stop_and_wait()).await;
    assert_eq!(handshake.phase(), Phase::Finished);
    worker.await.unwrap();
}

#[tokio::test]
async fn stop_after_the_worker_finished_returns_immediately() {
    let handshake = Handshake::new();
    drop(handshake.begin().unwrap());
    assert_eq!(handshake.phase(), Phase::Finished);

    // Stopping does not resurrect the slot.
    handshake.request_stop();
    assert_eq!(handshake.phase(), Phase::Finished);
    with_timeout(handshake.request_stop_and_wait()).await;
}

#[tokio::test(start_paused = true)]
async fn end_before_start_returns_and_blocks_later_firings() {
    init_tracing();
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("early-end", recorder.callback())
        .to_writer(io::sink())
        .every(ms(10));

    with_timeout(action.end()).await;

    action.start().unwrap();
    sleep(ms(100)).await;

    assert_eq!(recorder.count(), 0);
    assert_eq!(action.time_trigger().phase(), Phase::Finished);
}

#[tokio::test(start_paused = true)]
async fn end_before_the_first_firing_prevents_all_firings() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("pending", recorder.callback())
        .to_writer(io::sink())
        .after(ms(500))
        .every(ms(50));
    action.start().unwrap();

    sleep(ms(100)).await;
    let before = Instant::now();
    action.end().await;

    // The pending wait is cut short.
    assert!(before.elapsed() < ms(10));

    sleep(ms(1000)).await;
    assert_eq!(recorder.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn end_after_a_one_shot_returns_promptly() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("one-shot", recorder.callback())
        .to_writer(io::sink())
        .after(ms(10));
    action.start().unwrap();

    sleep(ms(50)).await;
    assert_eq!(recorder.count(), 1);
    assert_eq!(action.time_trigger().phase(), Phase::Finished);

    with_timeout(action.end()).await;
}

#[tokio::test(start_paused = true)]
async fn end_is_idempotent() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("twice", recorder.callback())
        .to_writer(io::sink())
        .every(ms(20));
    action.start().unwrap();

    sleep(ms(30)).await;
    with_timeout(action.end()).await;
    with_timeout(action.end()).await;

    assert_eq!(action.time_trigger().phase(), Phase::Finished);
    assert_eq!(action.signal_trigger().phase(), Phase::Finished);
}

#[tokio::test(start_paused = true)]
async fn end_stops_a_repeating_schedule() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("repeating", recorder.callback())
        .to_writer(io::sink())
        .every(ms(25));
    action.start().unwrap();

    sleep(ms(110)).await;
    action.end().await;
    let fired = recorder.count();
    assert_eq!(fired, 5);

    sleep(ms(500)).await;
    assert_eq!(recorder.count(), fired, "no firing after end returned");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn end_waits_for_an_in_flight_callback() {
    let entered = Arc::new(AtomicBool::new(false));
    let completed = Arc::new(AtomicBool::new(false));

    let mut action = {
        let entered = Arc::clone(&entered);
        let completed = Arc::clone(&completed);
        TriggeredAction::new("slow", move |_out: &mut Output| {
            entered.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(200));
            completed.store(true, Ordering::SeqCst);
            Ok(())
        })
        .to_writer(io::sink())
        .every(Duration::from_secs(10))
    };
    action.start().unwrap();

    while !entered.load(Ordering::SeqCst) {
        tokio::time::sleep(ms(5)).await;
    }

    with_timeout(action.end()).await;
    assert!(
        completed.load(Ordering::SeqCst),
        "end returned while the callback was still running"
    );
}
