use std::time::Duration;

use crate::{
    ATTEMPT_PREFIX, LOCK_PREFIX, LimitSpec, RateDecision, Threshold, TripwireError,
    common::{unix_expiry_after, unix_now},
    namespaced_key,
};

#[test]
fn threshold_try_from_validates_min_1() {
    let t = Threshold::try_from(1u32).unwrap();
    assert_eq!(*t, 1);

    assert_eq!(
        Threshold::try_from(0u32).unwrap_err(),
        "Threshold must be at least 1"
    );
}

#[test]
fn namespaced_key_joins_prefix_and_id() {
    assert_eq!(namespaced_key(LOCK_PREFIX, "ip1"), "blocks://ip1");
    assert_eq!(namespaced_key(ATTEMPT_PREFIX, "ip1"), "lock-count://ip1");
    assert_eq!(namespaced_key("app", ""), "app://");
}

#[test]
fn expiry_is_window_after_now() {
    let now = unix_now();
    let expiry = unix_expiry_after(Duration::from_secs(60));

    assert!(expiry >= now + 60);
    assert!(expiry <= now + 61);

    // sub-second windows truncate to the current second
    assert!(unix_expiry_after(Duration::from_millis(10)) - unix_now() <= 1);
}

#[test]
fn limit_spec_validates_parts() {
    let limit = LimitSpec::new(2, 5, Duration::from_secs(10)).unwrap();
    assert_eq!(limit.rate(), 2);
    assert_eq!(limit.burst(), 5);
    assert_eq!(limit.period(), Duration::from_secs(10));

    let cases = [
        (0, 1, Duration::from_secs(1), "Rate must be greater than 0"),
        (1, 0, Duration::from_secs(1), "Burst must be greater than 0"),
        (1, 1, Duration::ZERO, "Period must be greater than 0"),
    ];

    for (rate, burst, period, message) in cases {
        match LimitSpec::new(rate, burst, period) {
            Err(TripwireError::InvalidLimit(got)) => assert_eq!(got, message),
            other => panic!("expected InvalidLimit({message}), got {other:?}"),
        }
    }
}

#[test]
fn limit_spec_shorthands_set_period() {
    assert_eq!(
        LimitSpec::per_second(3).unwrap().period(),
        Duration::from_secs(1)
    );
    assert_eq!(
        LimitSpec::per_minute(3).unwrap().period(),
        Duration::from_secs(60)
    );

    let hourly = LimitSpec::per_hour(7).unwrap();
    assert_eq!(hourly.period(), Duration::from_secs(3600));
    assert_eq!(hourly.burst(), 7);

    assert!(LimitSpec::per_hour(0).is_err());
}

#[test]
fn rate_decision_allowed_means_positive() {
    let denied = RateDecision {
        allowed: 0,
        remaining: 0,
        retry_after: Duration::from_millis(100),
        reset_after: Duration::from_secs(1),
    };
    assert!(!denied.is_allowed());

    let admitted = RateDecision {
        allowed: 1,
        ..denied
    };
    assert!(admitted.is_allowed());
}

#[test]
fn error_predicates() {
    assert!(TripwireError::LockFailure.is_lock_failure());
    assert!(!TripwireError::LockFailure.is_overflow());

    assert!(TripwireError::Overflow.is_overflow());
    assert!(!TripwireError::Overflow.is_lock_failure());

    let unavailable = TripwireError::LockUnavailable("blocks://a".to_string());
    assert!(!unavailable.is_lock_failure());
    assert_eq!(unavailable.to_string(), "lock unavailable: blocks://a");
}

#[test]
fn codec_errors_convert() {
    let err: TripwireError = serde_json::from_slice::<Vec<i64>>(b"[1,").unwrap_err().into();

    assert!(matches!(err, TripwireError::Codec(_)));
}
