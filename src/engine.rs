//! Facade owning the registry, configuration, shared cache and executor.

use std::sync::Arc;
use std::time::Duration;

use crate::config::DegradeConfig;
use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::media::frame::MediaPayload;
use crate::pipeline::{
    CacheStats, Composer, Dispatcher, Executor, PipelineSpec, PipelineStep, ResultCache,
    RunControl, RunStats,
};
use crate::registry::OperationRegistry;
use crate::request::DegradeRequest;

/// What a successful request hands back to the response layer.
#[derive(Clone, Debug)]
pub struct DegradeOutcome {
    /// Degraded media.
    pub payload: MediaPayload,
    /// Applied operation ids, in execution order.
    pub degradation_types: Vec<String>,
    /// Counters for the run.
    pub stats: RunStats,
}

/// Shareable across threads; concurrent runs share only the registry and the cache.
#[derive(Debug)]
pub struct DegradeEngine {
    registry: Arc<OperationRegistry>,
    config: DegradeConfig,
    executor: Executor,
}

impl DegradeEngine {
    /// Engine over every built-in operation.
    pub fn new(config: DegradeConfig) -> DegradeResult<Self> {
        Self::with_registry(OperationRegistry::builtin(), config)
    }

    /// Engine over a caller-built registry. Fails on invalid config or defaults.
    pub fn with_registry(registry: OperationRegistry, config: DegradeConfig) -> DegradeResult<Self> {
        config.validate()?;
        config.check_defaults(&registry)?;

        let cache = if config.cache.enabled {
            ResultCache::new(config.cache.max_entries, config.cache.max_bytes)
        } else {
            ResultCache::disabled()
        };
        let dispatcher = Dispatcher::new(&config.workers)?;
        tracing::debug!(
            operations = registry.len(),
            cache = cache.is_enabled(),
            parallel = dispatcher.is_parallel(),
            "engine ready"
        );

        Ok(Self {
            registry: Arc::new(registry),
            config,
            executor: Executor::new(Arc::new(cache), dispatcher),
        })
    }

    /// Registered operations.
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &DegradeConfig {
        &self.config
    }

    /// Composer carrying the configured defaults and step limit.
    pub fn composer(&self) -> Composer<'_> {
        Composer::new(&self.registry)
            .with_defaults(&self.config.defaults)
            .with_max_steps(self.config.pipeline.max_steps)
    }

    /// Run control carrying the configured timeout, if any.
    pub fn run_control(&self) -> RunControl {
        match self.config.pipeline.timeout_ms {
            Some(ms) => RunControl::new().with_timeout(Duration::from_millis(ms)),
            None => RunControl::new(),
        }
    }

    /// Resolve, validate and order `spec` for `media_type` without running it.
    pub fn compose(
        &self,
        spec: &PipelineSpec,
        media_type: MediaType,
    ) -> DegradeResult<Vec<PipelineStep>> {
        self.composer().compose(spec, media_type)
    }

    /// Compose then execute. Composition errors surface before any step runs.
    pub fn run_pipeline(
        &self,
        payload: MediaPayload,
        spec: &PipelineSpec,
        control: &RunControl,
    ) -> DegradeResult<DegradeOutcome> {
        let steps = self.compose(spec, payload.media_type())?;
        let out = self.executor.run(payload, &steps, control)?;
        Ok(DegradeOutcome {
            payload: out.payload,
            degradation_types: out.degradation_types,
            stats: out.stats,
        })
    }

    /// Run a request shape from an outer layer.
    pub fn process(
        &self,
        payload: MediaPayload,
        request: &DegradeRequest,
        control: &RunControl,
    ) -> DegradeResult<DegradeOutcome> {
        let spec = request.to_pipeline_spec()?;
        self.run_pipeline(payload, &spec, control)
    }

    /// Drop every cached result; counters are kept.
    pub fn clear_cache(&self) {
        self.executor.cache().clear();
    }

    /// Snapshot of cache occupancy and counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.executor.cache().stats()
    }
}
