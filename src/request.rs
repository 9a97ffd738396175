//! Request shapes accepted from outer layers and their conversion into a [`PipelineSpec`].

use serde_json::Value;

use crate::foundation::error::{DegradeError, DegradeResult, FieldViolation};
use crate::ops::schema::RawParams;
use crate::pipeline::spec::{PipelineSpec, StepSpec};

/// Step name that expands into one step per entry of its params object.
pub const COMPOSITE_STEP: &str = "composite";

/// One named step of a composite request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NamedConfig {
    /// Operation id, or `composite`.
    pub name: String,
    /// Parameters; a lone nested `params` object is unwrapped.
    #[serde(default)]
    pub params: RawParams,
}

impl NamedConfig {
    /// Named step with `params`.
    pub fn new(name: impl Into<String>, params: RawParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// A single operation, or two to three named steps.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum DegradeRequest {
    /// One operation.
    Single {
        /// Operation id.
        operation: String,
        /// Parameters; a lone nested `params` object is unwrapped.
        #[serde(default)]
        params: RawParams,
    },
    /// Two or three named steps.
    Composite {
        /// First step.
        first: NamedConfig,
        /// Second step.
        second: NamedConfig,
        /// Optional third step.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        third: Option<NamedConfig>,
        /// Keep the listed order instead of sorting by tier.
        #[serde(default)]
        force_order: bool,
    },
}

impl DegradeRequest {
    /// Single-operation request.
    pub fn single(operation: impl Into<String>, params: RawParams) -> Self {
        Self::Single {
            operation: operation.into(),
            params,
        }
    }

    /// Parse either request shape from JSON.
    pub fn from_json_str(text: &str) -> DegradeResult<Self> {
        serde_json::from_str(text).map_err(|e| {
            DegradeError::config(format!(
                "request must be {{operation, params}} or {{first, second[, third]}}: {e}"
            ))
        })
    }

    /// Flatten into a pipeline, expanding `composite` steps.
    pub fn to_pipeline_spec(&self) -> DegradeResult<PipelineSpec> {
        match self {
            Self::Single { operation, params } => Ok(PipelineSpec::single(
                operation.clone(),
                unwrap_nested(params),
            )),
            Self::Composite {
                first,
                second,
                third,
                force_order,
            } => {
                let mut steps = Vec::new();
                for config in [Some(first), Some(second), third.as_ref()]
                    .into_iter()
                    .flatten()
                {
                    expand(config, &mut steps)?;
                }
                Ok(PipelineSpec::new(steps).with_force_order(*force_order))
            }
        }
    }
}

/// `{"params": {...}}` with nothing else beside it is unwrapped one level.
fn unwrap_nested(params: &RawParams) -> RawParams {
    match params.get("params") {
        Some(Value::Object(inner)) if params.len() == 1 => inner.clone(),
        _ => params.clone(),
    }
}

fn expand(config: &NamedConfig, steps: &mut Vec<StepSpec>) -> DegradeResult<()> {
    let params = unwrap_nested(&config.params);
    if config.name != COMPOSITE_STEP {
        steps.push(StepSpec::new(config.name.clone(), params));
        return Ok(());
    }
    for (name, value) in params {
        let step_params = match value {
            Value::Object(map) => unwrap_nested(&map),
            Value::Null => RawParams::new(),
            _ => {
                return Err(DegradeError::validation(
                    COMPOSITE_STEP,
                    FieldViolation::invalid_type(name),
                ));
            }
        };
        steps.push(StepSpec::new(name, step_params));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/request.rs"]
mod tests;
