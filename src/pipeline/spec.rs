//! Pipeline requests before any operation is resolved.

use crate::ops::schema::RawParams;

/// One requested step: an operation id plus raw, unvalidated parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepSpec {
    /// Operation id.
    pub operation: String,
    /// Parameters as supplied.
    #[serde(default)]
    pub params: RawParams,
}

impl StepSpec {
    /// Step for `operation` with `params`.
    pub fn new(operation: impl Into<String>, params: RawParams) -> Self {
        Self {
            operation: operation.into(),
            params,
        }
    }
}

/// Declarative pipeline as requested by a caller.
///
/// Steps run in tier order unless `force_order` is set, in which case the listed order is kept.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PipelineSpec {
    /// Steps as listed by the caller.
    pub steps: Vec<StepSpec>,
    /// Keep the listed order instead of sorting by tier.
    #[serde(default)]
    pub force_order: bool,
}

impl PipelineSpec {
    /// Tier-ordered pipeline of `steps`.
    pub fn new(steps: Vec<StepSpec>) -> Self {
        Self {
            steps,
            force_order: false,
        }
    }

    /// One-step pipeline.
    pub fn single(operation: impl Into<String>, params: RawParams) -> Self {
        Self::new(vec![StepSpec::new(operation, params)])
    }

    /// Set `force_order`.
    pub fn with_force_order(mut self, force_order: bool) -> Self {
        self.force_order = force_order;
        self
    }

    /// The first `n` steps, keeping `force_order`.
    pub fn prefix(&self, n: usize) -> Self {
        Self {
            steps: self.steps.iter().take(n).cloned().collect(),
            force_order: self.force_order,
        }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether there are no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
