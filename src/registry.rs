//! Closed mapping from operation id to implementation.
//!
//! The registry is filled once at startup and only read afterwards; callers share it behind an
//! `Arc` and never mutate it while requests are being served.

use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::MediaType;
use crate::foundation::error::{DegradeError, DegradeResult};
use crate::ops::{Operation, OperationDescriptor, StageTier, builtin_operations};

/// Operations by id, in registration order.
#[derive(Default)]
pub struct OperationRegistry {
    ops: Vec<Arc<dyn Operation>>,
    by_id: HashMap<&'static str, usize>,
}

impl OperationRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in operation.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for op in builtin_operations() {
            // Built-in ids are unique; a clash here is a programming error caught by tests.
            if let Err(err) = registry.register(op) {
                tracing::error!(%err, "skipping built-in operation");
            }
        }
        registry
    }

    /// Add an operation; ids must be unique.
    pub fn register(&mut self, op: Box<dyn Operation>) -> DegradeResult<()> {
        let id = op.id();
        if self.by_id.contains_key(id) {
            return Err(DegradeError::DuplicateOperation { id: id.to_owned() });
        }
        self.by_id.insert(id, self.ops.len());
        self.ops.push(Arc::from(op));
        Ok(())
    }

    /// Operation registered under `id`.
    pub fn resolve(&self, id: &str) -> DegradeResult<&Arc<dyn Operation>> {
        self.by_id
            .get(id)
            .map(|&idx| &self.ops[idx])
            .ok_or_else(|| DegradeError::UnknownOperation { id: id.to_owned() })
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Descriptors in registration order, optionally filtered by tier and media type.
    pub fn list(
        &self,
        stage_tier: Option<StageTier>,
        media_type: Option<MediaType>,
    ) -> Vec<&OperationDescriptor> {
        self.ops
            .iter()
            .map(|op| op.descriptor())
            .filter(|d| stage_tier.is_none_or(|t| d.stage_tier == t))
            .filter(|d| media_type.is_none_or(|m| d.supports(m)))
            .collect()
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.ops.iter().map(|op| op.id()))
            .finish()
    }
}

#[cfg(test)]
#[path = "../tests/unit/registry.rs"]
mod tests;
