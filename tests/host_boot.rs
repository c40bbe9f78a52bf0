mod common;
use crate::common::fake_action::{FakeAction, Journal, entries};
use crate::common::recorder::FiringRecorder;
use crate::common::{init_tracing, with_timeout};

use std::io;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use tripline::action::{Action, Host, TriggeredAction};
use tripline::errors::TriplineError;

fn journal() -> Journal {
    Journal::default()
}

#[tokio::test]
async fn boots_actions_in_order() {
    init_tracing();
    let journal = journal();

    let host = Host::start_all(vec![
        FakeAction::new("a", &journal).boxed(),
        FakeAction::new("b", &journal).boxed(),
        FakeAction::new("c", &journal).boxed(),
    ])
    .await
    .unwrap();

    assert_eq!(host.len(), 3);
    assert_eq!(host.names(), vec!["a", "b", "c"]);
    assert_eq!(entries(&journal), vec!["start:a", "start:b", "start:c"]);

    host.end_all().await;
    let ended: Vec<String> = entries(&journal).into_iter().skip(3).collect();
    assert_eq!(ended.len(), 3);
    for name in ["end:a", "end:b", "end:c"] {
        assert!(ended.iter().any(|e| e == name), "missing {name} in {ended:?}");
    }
}

#[tokio::test]
async fn failed_start_ends_the_started_ones_and_skips_the_rest() {
    init_tracing();
    let journal = journal();

    let err = Host::start_all(vec![
        FakeAction::new("a", &journal).boxed(),
        FakeAction::new("b", &journal).failing().boxed(),
        FakeAction::new("c", &journal).boxed(),
    ])
    .await
    .unwrap_err();

    assert!(matches!(err, TriplineError::ConfigError(_)));
    assert_eq!(entries(&journal), vec!["start:a", "start:b", "end:a"]);
}

#[tokio::test]
async fn failing_first_action_ends_nothing() {
    let journal = journal();

    let result = Host::start_all(vec![
        FakeAction::new("a", &journal).failing().boxed(),
        FakeAction::new("b", &journal).boxed(),
    ])
    .await;

    assert!(result.is_err());
    assert_eq!(entries(&journal), vec!["start:a"]);
}

#[tokio::test(start_paused = true)]
async fn end_all_ends_actions_concurrently() {
    let journal = journal();

    let host = Host::start_all(vec![
        FakeAction::new("a", &journal)
            .with_end_delay(Duration::from_millis(100))
            .boxed(),
        FakeAction::new("b", &journal)
            .with_end_delay(Duration::from_millis(100))
            .boxed(),
        FakeAction::new("c", &journal)
            .with_end_delay(Duration::from_millis(100))
            .boxed(),
    ])
    .await
    .unwrap();

    let before = Instant::now();
    host.end_all().await;
    let took = before.elapsed();

    assert!(
        took < Duration::from_millis(150),
        "ending took {took:?}, expected the slowest single action"
    );
    assert_eq!(entries(&journal).len(), 6);
}

#[tokio::test]
async fn empty_host_is_a_no_op() {
    let host = Host::start_all(Vec::new()).await.unwrap();
    assert!(host.is_empty());

    with_timeout(host.end_all()).await;
    with_timeout(host.wait_finished()).await;
}

#[tokio::test(start_paused = true)]
async fn hosts_real_triggered_actions() {
    init_tracing();
    let first = FiringRecorder::new();
    let second = FiringRecorder::new();

    let actions: Vec<Box<dyn Action>> = vec![
        Box::new(
            TriggeredAction::from_callback("fast", first.callback())
                .to_writer(io::sink())
                .every(Duration::from_millis(10)),
        ),
        Box::new(
            TriggeredAction::from_callback("once", second.callback())
                .to_writer(io::sink())
                .after(Duration::from_millis(30)),
        ),
    ];
    let host = Host::start_all(actions).await.unwrap();

    sleep(Duration::from_millis(55)).await;
    host.end_all().await;

    assert_eq!(first.count(), 6);
    assert_eq!(second.count(), 1);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(first.count(), 6);
}

#[tokio::test(start_paused = true)]
async fn wait_finished_resolves_when_all_actions_run_out() {
    let recorder = FiringRecorder::new();

    let actions: Vec<Box<dyn Action>> = vec![
        Box::new(
            TriggeredAction::from_callback("a", recorder.callback())
                .to_writer(io::sink())
                .after(Duration::from_millis(20)),
        ),
        Box::new(
            TriggeredAction::from_callback("b", recorder.callback())
                .to_writer(io::sink())
                .every(Duration::from_millis(10))
                .run_for(Duration::from_millis(35)),
        ),
    ];
    let host = Host::start_all(actions).await.unwrap();

    with_timeout(host.wait_finished()).await;
    assert_eq!(recorder.count(), 5);
    host.end_all().await;
}

#[test]
fn starting_outside_a_runtime_is_an_error() {
    let recorder = FiringRecorder::new();
    let mut action = TriggeredAction::from_callback("no-runtime", recorder.callback())
        .to_writer(io::sink())
        .every(Duration::from_millis(10));

    let err = action.start().unwrap_err();
    assert!(matches!(err, TriplineError::NoRuntime));
    assert!(!err.is_config_error());
}
