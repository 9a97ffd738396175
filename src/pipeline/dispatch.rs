//! Uniform application of one step to a still or a video.

use rayon::prelude::*;

use crate::config::WorkerConfig;
use crate::foundation::error::{DegradeError, DegradeResult};
use crate::media::frame::{Frame, MediaPayload, VideoClip};
use crate::ops::{FrameContext, ShapeEffect};
use crate::pipeline::compose::PipelineStep;
use crate::pipeline::control::RunControl;

/// Applies a step once to a still, or once per frame to a video (once per clip for operations
/// that transform whole clips).
///
/// Videos are all-or-nothing: if any frame fails the whole dispatch fails with the lowest failing
/// frame index, and no partial clip is produced. Frame order is kept when frames run on the pool.
pub struct Dispatcher {
    pool: Option<rayon::ThreadPool>,
    min_parallel_frames: usize,
}

impl Dispatcher {
    /// Frames run one after another on the calling thread.
    pub fn sequential() -> Self {
        Self {
            pool: None,
            min_parallel_frames: usize::MAX,
        }
    }

    /// Dispatcher per `workers`; sequential when frame parallelism is off.
    pub fn new(workers: &WorkerConfig) -> DegradeResult<Self> {
        if !workers.parallel_frames {
            return Ok(Self::sequential());
        }
        Ok(Self {
            pool: Some(build_thread_pool(workers.threads)?),
            min_parallel_frames: workers.min_parallel_frames.max(1),
        })
    }

    /// Whether a worker pool is available.
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Apply `step` to `payload`, rejecting unsupported media before any frame.
    #[tracing::instrument(skip_all, fields(op = step.id(), frames = payload.frame_count()))]
    pub fn apply(
        &self,
        step: &PipelineStep,
        payload: &MediaPayload,
        control: &RunControl,
    ) -> DegradeResult<MediaPayload> {
        let media_type = payload.media_type();
        if !step.operation().supports(media_type) {
            return Err(DegradeError::UnsupportedMediaType {
                operation: step.id().to_owned(),
                media_type,
            });
        }

        match payload {
            MediaPayload::Image(frame) => {
                control.check()?;
                let out = step
                    .operation()
                    .apply(frame, step.params(), FrameContext::still())
                    .map_err(|e| apply_error(step, None, e))?;
                check_shape(step, frame, &out, None)?;
                Ok(MediaPayload::Image(out))
            }
            MediaPayload::Video(clip) => {
                let frames = self.map_frames(step, clip, control)?;
                let clip = clip
                    .with_frames(frames)
                    .map_err(|e| DegradeError::apply(step.id(), e.to_string()))?;
                Ok(MediaPayload::Video(clip))
            }
        }
    }

    fn map_frames(
        &self,
        step: &PipelineStep,
        clip: &VideoClip,
        control: &RunControl,
    ) -> DegradeResult<Vec<Frame>> {
        let count = clip.frame_count();
        control.check()?;
        if let Some(result) = step.operation().apply_clip(clip, step.params()) {
            let frames = result.map_err(|e| apply_error(step, None, e))?;
            if frames.len() != count {
                return Err(DegradeError::apply(
                    step.id(),
                    format!("clip transform returned {} frames for {count}", frames.len()),
                ));
            }
            for (index, (input, output)) in clip.frames().iter().zip(&frames).enumerate() {
                check_shape(step, input, output, Some(index))?;
            }
            return Ok(frames);
        }

        let fps = Some(clip.fps());
        let run = |(index, frame): (usize, &Frame)| -> DegradeResult<Frame> {
            control.check()?;
            let ctx = FrameContext { index, count, fps };
            let out = step
                .operation()
                .apply(frame, step.params(), ctx)
                .map_err(|e| apply_error(step, Some(index), e))?;
            check_shape(step, frame, &out, Some(index))?;
            Ok(out)
        };

        match &self.pool {
            Some(pool) if count >= self.min_parallel_frames => {
                let results = pool.install(|| {
                    clip.frames()
                        .par_iter()
                        .enumerate()
                        .map(run)
                        .collect::<Vec<_>>()
                });
                // Sequential collect so the reported failure is the lowest frame index.
                results.into_iter().collect()
            }
            _ => clip.frames().iter().enumerate().map(run).collect(),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("threads", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .field("min_parallel_frames", &self.min_parallel_frames)
            .finish()
    }
}

fn apply_error(step: &PipelineStep, frame: Option<usize>, err: DegradeError) -> DegradeError {
    match (err, frame) {
        (err @ (DegradeError::Cancelled | DegradeError::Timeout { .. }), _) => err,
        (err, None) => DegradeError::apply(step.id(), err.to_string()),
        (err, Some(frame)) => DegradeError::FrameApply {
            operation: step.id().to_owned(),
            frame,
            reason: err.to_string(),
        },
    }
}

fn check_shape(
    step: &PipelineStep,
    input: &Frame,
    output: &Frame,
    frame: Option<usize>,
) -> DegradeResult<()> {
    let ok = match step.shape_effect() {
        ShapeEffect::Preserve => output.same_shape(input),
        ShapeEffect::Resize => output.format() == input.format(),
    };
    if ok {
        return Ok(());
    }
    let reason = DegradeError::media(format!(
        "output {}x{} {:?} does not match declared shape effect for input {}x{} {:?}",
        output.width(),
        output.height(),
        output.format(),
        input.width(),
        input.height(),
        input.format()
    ));
    Err(apply_error(step, frame, reason))
}

fn build_thread_pool(threads: Option<usize>) -> DegradeResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(DegradeError::config("workers.threads must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("degrade-frame-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| DegradeError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/dispatch.rs"]
mod tests;
