use serde_json::json;

use super::*;

fn ids(spec: &PipelineSpec) -> Vec<&str> {
    spec.steps.iter().map(|s| s.operation.as_str()).collect()
}

#[test]
fn single_request_becomes_one_step() {
    let req = DegradeRequest::from_json_str(
        r#"{"operation": "blur", "params": {"kernel_size": 5, "sigma": 1.0}}"#,
    )
    .unwrap();
    let spec = req.to_pipeline_spec().unwrap();
    assert_eq!(ids(&spec), ["blur"]);
    assert_eq!(spec.steps[0].params["kernel_size"], 5);
    assert!(!spec.force_order);
}

#[test]
fn nested_params_are_unwrapped() {
    let req = DegradeRequest::from_json_str(
        r#"{"operation": "noise", "params": {"params": {"intensity": 3.0}}}"#,
    )
    .unwrap();
    let spec = req.to_pipeline_spec().unwrap();
    assert_eq!(spec.steps[0].params["intensity"], 3.0);

    // Not unwrapped when something sits beside it.
    let raw = json!({"params": {"a": 1}, "b": 2}).as_object().cloned().unwrap();
    let spec = DegradeRequest::single("noise", raw.clone())
        .to_pipeline_spec()
        .unwrap();
    assert_eq!(spec.steps[0].params, raw);
}

#[test]
fn composite_keeps_named_order() {
    let req = DegradeRequest::from_json_str(
        r#"{
            "first": {"name": "noise", "params": {"seed": 1}},
            "second": {"name": "compression", "params": {"params": {"quality": 40}}},
            "third": {"name": "blur"}
        }"#,
    )
    .unwrap();
    let spec = req.to_pipeline_spec().unwrap();
    assert_eq!(ids(&spec), ["noise", "compression", "blur"]);
    assert_eq!(spec.steps[1].params["quality"], 40);
    assert!(spec.steps[2].params.is_empty());
}

#[test]
fn two_step_composite_and_force_order() {
    let req = DegradeRequest::from_json_str(
        r#"{"first": {"name": "dirt"}, "second": {"name": "blur"}, "force_order": true}"#,
    )
    .unwrap();
    let spec = req.to_pipeline_spec().unwrap();
    assert_eq!(ids(&spec), ["dirt", "blur"]);
    assert!(spec.force_order);
}

#[test]
fn composite_step_expands_in_object_order() {
    let req = DegradeRequest::from_json_str(
        r#"{
            "first": {"name": "composite", "params": {"motion_blur": {"angle": 45.0}, "aliasing": null}},
            "second": {"name": "noise"}
        }"#,
    )
    .unwrap();
    let spec = req.to_pipeline_spec().unwrap();
    assert_eq!(ids(&spec), ["motion_blur", "aliasing", "noise"]);
    assert_eq!(spec.steps[0].params["angle"], 45.0);

    let bad = DegradeRequest::from_json_str(
        r#"{"first": {"name": "composite", "params": {"blur": 3}}, "second": {"name": "noise"}}"#,
    )
    .unwrap();
    let err = bad.to_pipeline_spec().unwrap_err();
    assert_eq!(err.report().field.as_deref(), Some("invalid_type:blur"));
}

#[test]
fn malformed_requests_are_config_errors() {
    let err = DegradeRequest::from_json_str(r#"{"first": {"name": "blur"}}"#).unwrap_err();
    assert_eq!(err.kind(), "config");
}
