use super::*;
use crate::media::frame::Frame;
use crate::ops::schema::{ParamSchema, ParamSet};
use crate::ops::{FrameContext, ShapeEffect};

struct Invert {
    descriptor: OperationDescriptor,
}

impl Invert {
    fn new(id: &'static str) -> Self {
        Self {
            descriptor: OperationDescriptor {
                id,
                display_name: "Invert",
                version: 1,
                supported_media_types: vec![MediaType::Image],
                stage_tier: StageTier::Basic,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(Vec::new()),
            },
        }
    }
}

impl Operation for Invert {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, _params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        frame.with_data(frame.data().iter().map(|v| 255 - v).collect())
    }
}

#[test]
fn builtin_registers_every_operation() {
    let registry = OperationRegistry::builtin();
    assert_eq!(registry.len(), builtin_operations().len());
    assert!(registry.contains("motion_blur"));
    assert_eq!(registry.resolve("blur").unwrap().id(), "blur");
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut registry = OperationRegistry::new();
    registry.register(Box::new(Invert::new("invert"))).unwrap();
    let err = registry.register(Box::new(Invert::new("invert"))).unwrap_err();
    assert!(matches!(err, DegradeError::DuplicateOperation { ref id } if id == "invert"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn unknown_ids_fail_to_resolve() {
    let registry = OperationRegistry::builtin();
    let err = registry.resolve("sharpen").unwrap_err();
    assert_eq!(err.kind(), "unknown_operation");
    assert_eq!(err.operation(), Some("sharpen"));
}

#[test]
fn list_filters_and_keeps_registration_order() {
    let registry = OperationRegistry::builtin();
    let ids = |tier, media| {
        registry
            .list(tier, media)
            .iter()
            .map(|d| d.id)
            .collect::<Vec<_>>()
    };

    assert_eq!(ids(None, None).len(), registry.len());
    assert_eq!(
        ids(Some(StageTier::Basic), None),
        ["blur", "noise", "resample", "compression"]
    );
    assert_eq!(
        ids(Some(StageTier::Advanced), Some(MediaType::Image)),
        ["scratch", "dirt"]
    );
    assert_eq!(
        ids(Some(StageTier::Advanced), Some(MediaType::Video)),
        ["scratch", "dirt", "flicker", "shake"]
    );
}

#[test]
fn custom_operations_sit_beside_builtins() {
    let mut registry = OperationRegistry::builtin();
    registry.register(Box::new(Invert::new("invert"))).unwrap();
    let basic = registry.list(Some(StageTier::Basic), None);
    assert_eq!(basic.last().unwrap().id, "invert");
    assert!(registry.register(Box::new(Invert::new("blur"))).is_err());
}
