use std::fmt;

use crate::foundation::core::MediaType;

/// Result alias used across the crate.
pub type DegradeResult<T> = Result<T, DegradeError>;

/// Why a single parameter field was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// A required field was absent.
    Missing,
    /// The value is outside the declared range, enum, or a cross-field rule.
    OutOfRange,
    /// The value has the wrong JSON type.
    InvalidType,
    /// The field is not declared by the operation's schema.
    Unknown,
}

impl ViolationReason {
    /// Stable snake_case tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::OutOfRange => "out_of_range",
            Self::InvalidType => "invalid_type",
            Self::Unknown => "unknown",
        }
    }
}

/// Field-level validation failure, rendered as `"<reason>:<field>"`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FieldViolation {
    /// Offending parameter name.
    pub field: String,
    /// Rejection reason.
    pub reason: ViolationReason,
}

impl FieldViolation {
    /// Required field is absent.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, ViolationReason::Missing)
    }

    /// Value fails a range, enum, or cross-field check.
    pub fn out_of_range(field: impl Into<String>) -> Self {
        Self::new(field, ViolationReason::OutOfRange)
    }

    /// Value has the wrong type.
    pub fn invalid_type(field: impl Into<String>) -> Self {
        Self::new(field, ViolationReason::InvalidType)
    }

    /// Field is not part of the schema.
    pub fn unknown(field: impl Into<String>) -> Self {
        Self::new(field, ViolationReason::Unknown)
    }

    fn new(field: impl Into<String>, reason: ViolationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.reason.as_str(), self.field)
    }
}

/// Error taxonomy for registry, composition, and execution failures.
#[derive(thiserror::Error, Debug)]
pub enum DegradeError {
    /// No operation is registered under `id`.
    #[error("unknown operation '{id}'")]
    UnknownOperation {
        /// Requested id.
        id: String,
    },

    /// An operation with `id` is already registered.
    #[error("operation '{id}' is already registered")]
    DuplicateOperation {
        /// Id registered twice.
        id: String,
    },

    /// The operation does not accept the payload's media type.
    #[error("operation '{operation}' does not support {media_type} media")]
    UnsupportedMediaType {
        /// Operation id.
        operation: String,
        /// Media type of the payload.
        media_type: MediaType,
    },

    /// A parameter was rejected.
    #[error("validation error in '{operation}': {violation}")]
    Validation {
        /// Operation id.
        operation: String,
        /// First rejected field.
        violation: FieldViolation,
    },

    /// The pipeline has no steps.
    #[error("pipeline has no steps")]
    EmptyPipeline,

    /// The pipeline exceeds the configured step limit.
    #[error("pipeline has {len} steps, at most {max} are allowed")]
    PipelineTooLong {
        /// Steps requested.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// The operation failed on a still or a whole clip.
    #[error("operation '{operation}' failed: {reason}")]
    Apply {
        /// Operation id.
        operation: String,
        /// Failure message.
        reason: String,
    },

    /// The operation failed on one video frame.
    #[error("operation '{operation}' failed on frame {frame}: {reason}")]
    FrameApply {
        /// Operation id.
        operation: String,
        /// Index of the failing frame.
        frame: usize,
        /// Failure message.
        reason: String,
    },

    /// The run exceeded its time budget.
    #[error("pipeline run exceeded its {budget_ms} ms budget ({elapsed_ms} ms elapsed)")]
    Timeout {
        /// Time spent before the run stopped.
        elapsed_ms: u64,
        /// Configured budget.
        budget_ms: u64,
    },

    /// The run was cancelled through its token.
    #[error("pipeline run was cancelled")]
    Cancelled,

    /// Media could not be decoded, encoded, or stored.
    #[error("media error: {0}")]
    Media(String),

    /// Configuration or request shape is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DegradeError {
    /// Build a [`DegradeError::Validation`].
    pub fn validation(operation: impl Into<String>, violation: FieldViolation) -> Self {
        Self::Validation {
            operation: operation.into(),
            violation,
        }
    }

    /// Build a [`DegradeError::Apply`].
    pub fn apply(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Apply {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`DegradeError::Media`].
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`DegradeError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable snake_case tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::DuplicateOperation { .. } => "duplicate_operation",
            Self::UnsupportedMediaType { .. } => "unsupported_media_type",
            Self::Validation { .. } => "validation",
            Self::EmptyPipeline => "empty_pipeline",
            Self::PipelineTooLong { .. } => "pipeline_too_long",
            Self::Apply { .. } => "apply",
            Self::FrameApply { .. } => "frame_apply",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::Media(_) => "media",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }

    /// Operation id the error is attributed to, if any.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::UnknownOperation { id } | Self::DuplicateOperation { id } => Some(id),
            Self::UnsupportedMediaType { operation, .. }
            | Self::Validation { operation, .. }
            | Self::Apply { operation, .. }
            | Self::FrameApply { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Structured form for outer layers (kind + reason + offending field/operation/frame).
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            operation: self.operation().map(str::to_owned),
            field: match self {
                Self::Validation { violation, .. } => Some(violation.to_string()),
                _ => None,
            },
            frame: match self {
                Self::FrameApply { frame, .. } => Some(*frame),
                _ => None,
            },
        }
    }
}

/// Serializable error description handed to response formatting.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ErrorReport {
    /// Stable error kind tag.
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Operation the error is attributed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Offending field as `"<reason>:<field>"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Failing frame index for video failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<usize>,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
