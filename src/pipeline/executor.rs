//! Runs composed steps in order, serving and filling the result cache by prefix.

use std::sync::Arc;
use std::time::Instant;

use crate::foundation::error::{DegradeError, DegradeResult};
use crate::media::fingerprint::fingerprint_payload;
use crate::media::frame::MediaPayload;
use crate::pipeline::cache::{CacheKey, ResultCache};
use crate::pipeline::compose::PipelineStep;
use crate::pipeline::control::RunControl;
use crate::pipeline::dispatch::Dispatcher;

/// Counters for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunStats {
    /// Steps in the pipeline.
    pub steps: usize,
    /// Steps served from the cache.
    pub cache_hits: usize,
    /// Steps that ran.
    pub cache_misses: usize,
    /// Frames actually degraded (cache hits contribute nothing).
    pub frames_processed: usize,
    /// Wall time of the run.
    pub elapsed_ms: u64,
}

/// Result of a successful run.
#[derive(Clone, Debug)]
pub struct RunOutput {
    /// Output of the last step.
    pub payload: MediaPayload,
    /// Applied operation ids, in execution order.
    pub degradation_types: Vec<String>,
    /// Counters for the run.
    pub stats: RunStats,
}

/// Runs composed steps strictly in sequence, consulting the shared cache before each one.
#[derive(Debug)]
pub struct Executor {
    cache: Arc<ResultCache>,
    dispatcher: Dispatcher,
}

impl Executor {
    /// Executor sharing `cache` with other executors.
    pub fn new(cache: Arc<ResultCache>, dispatcher: Dispatcher) -> Self {
        Self { cache, dispatcher }
    }

    /// The shared result cache.
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Any failure aborts the run; results of steps that finished earlier stay cached.
    #[tracing::instrument(skip_all, fields(steps = steps.len(), media = %payload.media_type()))]
    pub fn run(
        &self,
        payload: MediaPayload,
        steps: &[PipelineStep],
        control: &RunControl,
    ) -> DegradeResult<RunOutput> {
        if steps.is_empty() {
            return Err(DegradeError::EmptyPipeline);
        }
        let started = Instant::now();
        let media = fingerprint_payload(&payload);
        let mut current = Arc::new(payload);
        let mut prefix = Vec::with_capacity(steps.len());
        let mut degradation_types = Vec::with_capacity(steps.len());
        let mut stats = RunStats::default();

        for step in steps {
            control.check()?;
            prefix.push(step.signature());
            let key = CacheKey::new(media, &prefix);

            current = match self.cache.get(&key) {
                Some(hit) => {
                    stats.cache_hits += 1;
                    hit
                }
                None => {
                    let out = Arc::new(self.dispatcher.apply(step, &current, control)?);
                    stats.cache_misses += 1;
                    stats.frames_processed += out.frame_count();
                    self.cache.put(key, Arc::clone(&out));
                    out
                }
            };
            degradation_types.push(step.id().to_owned());
            stats.steps += 1;
        }

        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            types = ?degradation_types,
            hits = stats.cache_hits,
            misses = stats.cache_misses,
            elapsed_ms = stats.elapsed_ms,
            "pipeline finished"
        );
        Ok(RunOutput {
            payload: Arc::unwrap_or_clone(current),
            degradation_types,
            stats,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/executor.rs"]
mod tests;
