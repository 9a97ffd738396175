use super::*;

#[test]
fn violation_renders_reason_then_field() {
    assert_eq!(
        FieldViolation::out_of_range("kernel_size").to_string(),
        "out_of_range:kernel_size"
    );
    assert_eq!(FieldViolation::missing("sigma").to_string(), "missing:sigma");
    assert_eq!(
        FieldViolation::invalid_type("seed").to_string(),
        "invalid_type:seed"
    );
    assert_eq!(FieldViolation::unknown("foo").to_string(), "unknown:foo");
}

#[test]
fn display_prefixes_are_stable() {
    let err = DegradeError::validation("blur", FieldViolation::out_of_range("kernel_size"));
    assert!(err.to_string().contains("validation error in 'blur'"));
    assert!(
        DegradeError::media("x")
            .to_string()
            .contains("media error:")
    );
    assert!(
        DegradeError::config("x")
            .to_string()
            .contains("config error:")
    );
}

#[test]
fn report_carries_structured_fields() {
    let err = DegradeError::FrameApply {
        operation: "noise".to_string(),
        frame: 7,
        reason: "corrupt".to_string(),
    };
    let report = err.report();
    assert_eq!(report.kind, "frame_apply");
    assert_eq!(report.operation.as_deref(), Some("noise"));
    assert_eq!(report.frame, Some(7));
    assert_eq!(report.field, None);

    let err = DegradeError::validation("blur", FieldViolation::out_of_range("kernel_size"));
    let report = err.report();
    assert_eq!(report.kind, "validation");
    assert_eq!(report.field.as_deref(), Some("out_of_range:kernel_size"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DegradeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), "other");
}
