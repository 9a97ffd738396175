//! Turns a [`PipelineSpec`] into validated, ordered [`PipelineStep`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::foundation::core::MediaType;
use crate::foundation::error::{DegradeError, DegradeResult};
use crate::ops::schema::{ParamSet, RawParams};
use crate::ops::{Operation, OperationDescriptor, ShapeEffect};
use crate::pipeline::cache::StepSignature;
use crate::pipeline::spec::PipelineSpec;
use crate::pipeline::stage::canonical_order;
use crate::registry::OperationRegistry;

/// Configured parameter defaults, keyed by operation id.
pub type ParamDefaults = BTreeMap<String, RawParams>;

/// A resolved operation with fully validated parameters.
#[derive(Clone)]
pub struct PipelineStep {
    operation: Arc<dyn Operation>,
    params: ParamSet,
}

impl PipelineStep {
    /// Pair an operation with parameters it already validated.
    pub fn new(operation: Arc<dyn Operation>, params: ParamSet) -> Self {
        Self { operation, params }
    }

    /// Operation id.
    pub fn id(&self) -> &'static str {
        self.operation.id()
    }

    /// The resolved operation.
    pub fn operation(&self) -> &dyn Operation {
        self.operation.as_ref()
    }

    /// Descriptor of the operation.
    pub fn descriptor(&self) -> &OperationDescriptor {
        self.operation.descriptor()
    }

    /// Validated parameters.
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    /// Shape effect for these parameters.
    pub fn shape_effect(&self) -> ShapeEffect {
        self.operation.shape_effect(&self.params)
    }

    /// Cache-key component: id plus canonical parameters.
    pub fn signature(&self) -> StepSignature {
        StepSignature {
            operation: self.id().to_owned(),
            params: self.params.signature(),
        }
    }
}

impl std::fmt::Debug for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStep")
            .field("operation", &self.id())
            .field("params", &self.params)
            .finish()
    }
}

/// Turns a [`PipelineSpec`] into an ordered, validated execution plan. Never runs an operation.
pub struct Composer<'a> {
    registry: &'a OperationRegistry,
    defaults: Option<&'a ParamDefaults>,
    max_steps: usize,
}

impl<'a> Composer<'a> {
    /// Composer over `registry` with no defaults and no step limit.
    pub fn new(registry: &'a OperationRegistry) -> Self {
        Self {
            registry,
            defaults: None,
            max_steps: usize::MAX,
        }
    }

    /// Layer configured defaults beneath request parameters.
    pub fn with_defaults(mut self, defaults: &'a ParamDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Reject pipelines longer than `max_steps`.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Resolve every step, check media support and parameters, then order the steps.
    #[tracing::instrument(skip_all, fields(steps = spec.len(), media = %media_type))]
    pub fn compose(
        &self,
        spec: &PipelineSpec,
        media_type: MediaType,
    ) -> DegradeResult<Vec<PipelineStep>> {
        // Unknown ids are reported ahead of the length limit.
        let operations = spec
            .steps
            .iter()
            .map(|entry| self.registry.resolve(&entry.operation))
            .collect::<DegradeResult<Vec<_>>>()?;
        if spec.len() > self.max_steps {
            return Err(DegradeError::PipelineTooLong {
                len: spec.len(),
                max: self.max_steps,
            });
        }

        let mut steps = Vec::with_capacity(spec.len());
        for (entry, operation) in spec.steps.iter().zip(operations) {
            if !operation.supports(media_type) {
                return Err(DegradeError::UnsupportedMediaType {
                    operation: operation.id().to_owned(),
                    media_type,
                });
            }
            let defaults = self.defaults.and_then(|d| d.get(operation.id()));
            let params = operation.validate(&entry.params, defaults)?;
            steps.push(PipelineStep::new(Arc::clone(operation), params));
        }

        if !spec.force_order {
            canonical_order(&mut steps, |s| s.descriptor().stage_tier);
        }
        if steps.is_empty() {
            return Err(DegradeError::EmptyPipeline);
        }

        tracing::debug!(
            order = ?steps.iter().map(PipelineStep::id).collect::<Vec<_>>(),
            forced = spec.force_order,
            "pipeline composed"
        );
        Ok(steps)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/compose.rs"]
mod tests;
