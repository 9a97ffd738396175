use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::config::WorkerConfig;
use crate::foundation::core::{Fps, MediaType};
use crate::media::frame::PixelFormat;
use crate::ops::schema::{ParamSchema, ParamSet, RawParams};
use crate::ops::{Operation, OperationDescriptor, StageTier};
use crate::pipeline::control::CancelToken;
use crate::registry::OperationRegistry;

/// Fails on one frame index, otherwise writes the index into every byte.
struct FailOn {
    descriptor: OperationDescriptor,
    frame: usize,
}

impl FailOn {
    fn new(frame: usize, shape_effect: ShapeEffect) -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "fail_on",
                display_name: "Fail On",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Basic,
                shape_effect,
                parameter_schema: ParamSchema::new(Vec::new()),
            },
            frame,
        }
    }
}

impl Operation for FailOn {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, _params: &ParamSet, ctx: FrameContext) -> DegradeResult<Frame> {
        if ctx.index == self.frame {
            return Err(DegradeError::media("corrupt frame"));
        }
        frame.with_data(vec![ctx.index as u8; frame.byte_len()])
    }
}

/// Returns a frame one pixel wider than its input.
struct Grow(OperationDescriptor);

impl Operation for Grow {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.0
    }

    fn apply(&self, frame: &Frame, _params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        Frame::filled(frame.width() + 1, frame.height(), frame.format(), &[0])
    }
}

/// Reverses the clip as a whole; `drop_last` returns one frame too few.
struct Reverse {
    descriptor: OperationDescriptor,
    drop_last: bool,
}

impl Reverse {
    fn new(drop_last: bool) -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "reverse",
                ..FailOn::new(0, ShapeEffect::Preserve).descriptor
            },
            drop_last,
        }
    }
}

impl Operation for Reverse {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, _params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        Ok(frame.clone())
    }

    fn apply_clip(
        &self,
        clip: &VideoClip,
        _params: &ParamSet,
    ) -> Option<DegradeResult<Vec<Frame>>> {
        let mut frames = clip.frames().iter().rev().cloned().collect::<Vec<_>>();
        if self.drop_last {
            frames.pop();
        }
        Some(Ok(frames))
    }
}

fn step(op: impl Operation + 'static) -> PipelineStep {
    let params = op.validate(&RawParams::new(), None).unwrap();
    PipelineStep::new(Arc::new(op), params)
}

fn builtin_step(id: &str, params: serde_json::Value) -> PipelineStep {
    let registry = OperationRegistry::builtin();
    let op = Arc::clone(registry.resolve(id).unwrap());
    let params = op
        .validate(&params.as_object().cloned().unwrap(), None)
        .unwrap();
    PipelineStep::new(op, params)
}

fn clip(n: usize) -> MediaPayload {
    let frames = (0..n)
        .map(|i| Frame::filled(3, 2, PixelFormat::L8, &[i as u8 * 10]).unwrap())
        .collect();
    MediaPayload::Video(VideoClip::new(frames, Fps::new(24, 1).unwrap(), None).unwrap())
}

fn parallel() -> Dispatcher {
    Dispatcher::new(&WorkerConfig {
        threads: Some(3),
        parallel_frames: true,
        min_parallel_frames: 2,
    })
    .unwrap()
}

#[test]
fn video_frames_keep_count_and_order() {
    let op = step(FailOn::new(usize::MAX, ShapeEffect::Preserve));
    for dispatcher in [Dispatcher::sequential(), parallel()] {
        let out = dispatcher.apply(&op, &clip(9), &RunControl::new()).unwrap();
        assert_eq!(out.frame_count(), 9);
        for (i, frame) in out.frames().iter().enumerate() {
            assert!(frame.data().iter().all(|v| *v == i as u8));
        }
        assert_eq!(out.fps(), Some(Fps::new(24, 1).unwrap()));
    }
}

#[test]
fn a_failing_frame_fails_the_whole_dispatch() {
    let op = step(FailOn::new(4, ShapeEffect::Preserve));
    for dispatcher in [Dispatcher::sequential(), parallel()] {
        match dispatcher.apply(&op, &clip(8), &RunControl::new()) {
            Err(DegradeError::FrameApply {
                operation, frame, ..
            }) => {
                assert_eq!(operation, "fail_on");
                assert_eq!(frame, 4);
            }
            other => panic!("expected frame failure, got {other:?}"),
        }
    }
}

#[test]
fn still_failures_are_apply_errors() {
    let op = step(FailOn::new(0, ShapeEffect::Preserve));
    let still = MediaPayload::Image(Frame::filled(2, 2, PixelFormat::L8, &[1]).unwrap());
    let err = Dispatcher::sequential()
        .apply(&op, &still, &RunControl::new())
        .unwrap_err();
    assert_eq!(err.kind(), "apply");
    assert_eq!(err.operation(), Some("fail_on"));
}

#[test]
fn undeclared_shape_changes_are_rejected() {
    let grow = step(Grow(FailOn::new(0, ShapeEffect::Preserve).descriptor));
    let still = MediaPayload::Image(Frame::filled(2, 2, PixelFormat::L8, &[1]).unwrap());
    assert!(
        Dispatcher::sequential()
            .apply(&grow, &still, &RunControl::new())
            .is_err()
    );

    let declared = step(Grow(FailOn::new(0, ShapeEffect::Resize).descriptor));
    let out = Dispatcher::sequential()
        .apply(&declared, &clip(3), &RunControl::new())
        .unwrap();
    assert_eq!(out.dimensions(), (4, 2));
    assert_eq!(out.frame_count(), 3);
}

#[test]
fn resample_may_shrink_every_frame() {
    let shrink = builtin_step(
        "resample",
        json!({"scale_factor": 0.5, "restore_size": false}),
    );
    let frames = (0..4)
        .map(|_| Frame::filled(8, 6, PixelFormat::Rgb8, &[1, 2, 3]).unwrap())
        .collect();
    let video = MediaPayload::Video(VideoClip::new(frames, Fps::new(30, 1).unwrap(), None).unwrap());
    let out = parallel().apply(&shrink, &video, &RunControl::new()).unwrap();
    assert_eq!(out.dimensions(), (4, 3));
    assert_eq!(out.frame_count(), 4);
}

#[test]
fn unsupported_media_is_rejected_before_any_frame() {
    let flicker = builtin_step("flicker", json!({}));
    let still = MediaPayload::Image(Frame::filled(2, 2, PixelFormat::L8, &[1]).unwrap());
    let err = Dispatcher::sequential()
        .apply(&flicker, &still, &RunControl::new())
        .unwrap_err();
    assert_eq!(err.kind(), "unsupported_media_type");
}

#[test]
fn cancelled_runs_stop_with_cancelled() {
    let token = CancelToken::new();
    token.cancel();
    let control = RunControl::new().with_cancel(token);
    let op = step(FailOn::new(usize::MAX, ShapeEffect::Preserve));
    for dispatcher in [Dispatcher::sequential(), parallel()] {
        let err = dispatcher.apply(&op, &clip(5), &control).unwrap_err();
        assert!(matches!(err, DegradeError::Cancelled));
    }
}

#[test]
fn zero_threads_is_a_config_error() {
    let err = Dispatcher::new(&WorkerConfig {
        threads: Some(0),
        ..WorkerConfig::default()
    })
    .unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[test]
fn clip_transforms_replace_the_frame_loop() {
    let reverse = step(Reverse::new(false));
    for dispatcher in [Dispatcher::sequential(), parallel()] {
        let out = dispatcher.apply(&reverse, &clip(4), &RunControl::new()).unwrap();
        let firsts = out.frames().iter().map(|f| f.data()[0]).collect::<Vec<_>>();
        assert_eq!(firsts, [30, 20, 10, 0]);
    }

    // Stills still go through the per-frame path.
    let still = MediaPayload::Image(Frame::filled(2, 2, PixelFormat::L8, &[5]).unwrap());
    let out = Dispatcher::sequential()
        .apply(&reverse, &still, &RunControl::new())
        .unwrap();
    assert_eq!(out, still);
}

#[test]
fn clip_transforms_must_keep_the_frame_count() {
    let short = step(Reverse::new(true));
    let err = Dispatcher::sequential()
        .apply(&short, &clip(4), &RunControl::new())
        .unwrap_err();
    assert_eq!(err.kind(), "apply");
    assert_eq!(err.operation(), Some("reverse"));
}
