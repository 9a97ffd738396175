use super::*;

#[test]
fn fresh_control_passes() {
    assert!(RunControl::new().check().is_ok());
    let generous = RunControl::new().with_timeout(Duration::from_secs(3600));
    assert!(generous.check().is_ok());
}

#[test]
fn cancellation_is_shared_between_clones() {
    let token = CancelToken::new();
    let control = RunControl::new().with_cancel(token.clone());
    assert!(!control.cancel_token().is_cancelled());

    token.cancel();
    assert!(matches!(control.check(), Err(DegradeError::Cancelled)));
    assert!(matches!(control.clone().check(), Err(DegradeError::Cancelled)));
}

#[test]
fn zero_budget_times_out() {
    let control = RunControl::new().with_timeout(Duration::ZERO);
    match control.check() {
        Err(DegradeError::Timeout { budget_ms, .. }) => assert_eq!(budget_ms, 0),
        other => panic!("expected timeout, got {other:?}"),
    }
}
