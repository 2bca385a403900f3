// tests/retry_cancel.rs

use std::time::Duration;

use steprun::retry::{Level, RetryError, RetryExecutor, RetryPolicy, cancel_pair};
use steprun_test_utils::init_tracing;
use steprun_test_utils::recording::RecordingNotifier;
use steprun_test_utils::scripted::ScriptedStep;

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_never_invokes_step() {
    init_tracing();

    let (handle, signal) = cancel_pair();
    handle.cancel();

    let mut step = ScriptedStep::succeeding("late");
    let notifier = RecordingNotifier::new();
    let err = RetryExecutor::new(RetryPolicy::immediate(3), &notifier)
        .with_cancel(signal)
        .run(&mut step)
        .await
        .unwrap_err();

    assert!(matches!(err, RetryError::Cancelled { attempts: 0, .. }), "got {err:?}");
    assert_eq!(step.call_count(), 0);
    assert_eq!(
        notifier.messages(),
        vec!["step 'late' cancelled after 0 attempts".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_during_backoff_stops_further_attempts() {
    init_tracing();

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.cancel();
    });

    let mut step = ScriptedStep::always_failing("flaky");
    let notifier = RecordingNotifier::new();
    // First backoff is 2s, so the cancel at 500ms lands inside it.
    let err = RetryExecutor::new(
        RetryPolicy::exponential(5, Duration::from_secs(1)),
        &notifier,
    )
    .with_cancel(signal)
    .run(&mut step)
    .await
    .unwrap_err();

    assert!(matches!(err, RetryError::Cancelled { attempts: 1, .. }), "got {err:?}");
    assert_eq!(step.call_count(), 1);
    assert_eq!(notifier.levels(), vec![Level::Error, Level::Error]);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_attempt_drops_it() {
    init_tracing();

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.cancel();
    });

    let mut step = ScriptedStep::succeeding("slow").hanging_for(Duration::from_secs(30));
    let notifier = RecordingNotifier::new();
    let started = tokio::time::Instant::now();

    let err = RetryExecutor::new(RetryPolicy::immediate(3), &notifier)
        .with_cancel(signal)
        .run(&mut step)
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(err.attempts(), 1);
    assert_eq!(step.call_count(), 1);
    assert_eq!(
        notifier.messages(),
        vec!["step 'slow' cancelled after 1 attempts".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn dropped_handle_does_not_cancel() {
    init_tracing();

    let (handle, signal) = cancel_pair();
    drop(handle);

    let mut step = ScriptedStep::failing("steady", 1);
    let notifier = RecordingNotifier::new();
    let done = RetryExecutor::new(
        RetryPolicy::exponential(2, Duration::from_millis(10)),
        &notifier,
    )
    .with_cancel(signal)
    .run(&mut step)
    .await
    .expect("should succeed on retry");

    assert_eq!(done.attempts, 2);
}
