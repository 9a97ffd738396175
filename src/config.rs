//! Engine configuration, loaded once at startup and read-only afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use crate::foundation::error::{DegradeError, DegradeResult};
use crate::ops::schema::RawParams;
use crate::registry::OperationRegistry;

/// Engine configuration; every section falls back to its defaults.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DegradeConfig {
    /// Result cache budget.
    pub cache: CacheConfig,
    /// Per-frame worker pool.
    pub workers: WorkerConfig,
    /// Pipeline limits.
    pub pipeline: PipelineConfig,
    /// Per-operation parameter defaults, layered beneath request values and above schema
    /// defaults.
    pub defaults: BTreeMap<String, RawParams>,
}

/// Result cache settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// When false, every lookup misses and nothing is stored.
    pub enabled: bool,
    /// Most entries kept before the least recently used is evicted.
    pub max_entries: usize,
    /// Most decoded pixel bytes kept across all entries.
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 64,
            max_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Frame-level parallelism for video steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Worker threads for per-frame work; `None` uses rayon's default.
    pub threads: Option<usize>,
    /// Run video frames on a rayon pool.
    pub parallel_frames: bool,
    /// Shorter videos are processed on the calling thread.
    pub min_parallel_frames: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: None,
            parallel_frames: true,
            min_parallel_frames: 4,
        }
    }
}

/// Limits applied to every composed pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Longest accepted pipeline, after `composite` expansion.
    pub max_steps: usize,
    /// Default run budget; `None` means unbounded.
    pub timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_steps: 8,
            timeout_ms: None,
        }
    }
}

impl DegradeConfig {
    /// Parse and structurally validate a JSON config.
    pub fn from_json_str(text: &str) -> DegradeResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| DegradeError::config(format!("parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn from_path(path: &Path) -> DegradeResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DegradeError::config(format!("read '{}': {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Structural checks that need no registry.
    pub fn validate(&self) -> DegradeResult<()> {
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(DegradeError::config("cache.max_entries must be >= 1"));
        }
        if self.cache.enabled && self.cache.max_bytes == 0 {
            return Err(DegradeError::config("cache.max_bytes must be >= 1"));
        }
        if self.workers.threads == Some(0) {
            return Err(DegradeError::config("workers.threads must be >= 1 when set"));
        }
        if self.pipeline.max_steps == 0 {
            return Err(DegradeError::config("pipeline.max_steps must be >= 1"));
        }
        Ok(())
    }

    /// Every `defaults` entry must name a registered operation, and each value must be a declared
    /// field of the right type and range. Cross-field rules are checked per request.
    pub fn check_defaults(&self, registry: &OperationRegistry) -> DegradeResult<()> {
        for (id, defaults) in &self.defaults {
            let op = registry.resolve(id).map_err(|_| {
                DegradeError::config(format!("defaults name unknown operation '{id}'"))
            })?;
            op.descriptor()
                .parameter_schema
                .check_defaults(defaults)
                .map_err(|violation| {
                    DegradeError::config(format!("defaults for '{id}': {violation}"))
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
