// tests/retry_policy.rs

use std::time::Duration;

use steprun::retry::{AttemptOutcome, AttemptRecord, RetryPolicy, RetryState};

fn failure(attempt: u32) -> AttemptRecord {
    AttemptRecord {
        attempt,
        outcome: AttemptOutcome::Failure,
    }
}

fn success(attempt: u32) -> AttemptRecord {
    AttemptRecord {
        attempt,
        outcome: AttemptOutcome::Success,
    }
}

#[test]
fn delay_is_base_times_two_to_the_failure_count() {
    let policy = RetryPolicy::exponential(10, Duration::from_millis(10));

    assert_eq!(policy.delay_after(1), Duration::from_millis(20));
    assert_eq!(policy.delay_after(2), Duration::from_millis(40));
    assert_eq!(policy.delay_after(3), Duration::from_millis(80));
    assert_eq!(policy.delay_after(5), Duration::from_millis(320));
}

#[test]
fn zero_base_delay_is_always_zero() {
    let policy = RetryPolicy::immediate(10);
    for failures in 0..40 {
        assert_eq!(policy.delay_after(failures), Duration::ZERO);
    }
}

#[test]
fn max_delay_caps_backoff() {
    let policy = RetryPolicy::exponential(10, Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(10));

    assert_eq!(policy.delay_after(3), Duration::from_secs(8));
    assert_eq!(policy.delay_after(4), Duration::from_secs(10));
    assert_eq!(policy.delay_after(20), Duration::from_secs(10));
}

#[test]
fn huge_failure_counts_saturate_instead_of_panicking() {
    let policy = RetryPolicy::exponential(u32::MAX, Duration::from_secs(1));
    assert!(policy.delay_after(200) >= Duration::from_secs(u32::MAX as u64));
}

#[test]
fn validate_rejects_zero_attempts_and_zero_timeout() {
    assert!(RetryPolicy::immediate(1).validate().is_ok());
    assert!(RetryPolicy::default().validate().is_ok());

    let err = RetryPolicy::immediate(0).validate().unwrap_err();
    assert!(err.contains("max_attempts"), "got: {err}");

    let err = RetryPolicy::immediate(3)
        .with_attempt_timeout(Duration::ZERO)
        .validate()
        .unwrap_err();
    assert!(err.contains("attempt_timeout"), "got: {err}");
}

#[test]
fn state_machine_follows_attempt_outcomes() {
    let max = 3;
    let state = RetryState::initial();
    assert_eq!(state.next_attempt(), Some(1));

    let state = state.advance(failure(1), max);
    assert_eq!(state, RetryState::Running { failures: 1 });
    assert_eq!(state.next_attempt(), Some(2));

    let state = state.advance(failure(2), max);
    assert_eq!(state, RetryState::Running { failures: 2 });

    let state = state.advance(success(3), max);
    assert_eq!(state, RetryState::Succeeded { attempts: 3 });
    assert!(state.is_terminal());
    assert_eq!(state.next_attempt(), None);
}

#[test]
fn state_machine_fails_when_bound_is_reached() {
    let state = RetryState::initial().advance(failure(1), 1);
    assert_eq!(state, RetryState::Failed { attempts: 1 });

    let state = RetryState::initial()
        .advance(failure(1), 2)
        .advance(failure(2), 2);
    assert_eq!(state, RetryState::Failed { attempts: 2 });
    assert_eq!(state.attempts(), 2);
}

#[test]
fn terminal_states_absorb_further_records() {
    let done = RetryState::Succeeded { attempts: 1 };
    assert_eq!(done.advance(failure(2), 5), done);

    let failed = RetryState::Failed { attempts: 2 };
    assert_eq!(failed.advance(success(3), 5), failed);
}
