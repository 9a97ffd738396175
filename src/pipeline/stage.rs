//! Tier ordering.
//!
//! Tiers are totally ordered (basic < intermediate < advanced). The canonical execution order
//! sorts by tier and keeps the caller's relative order inside a tier, so callers can only reorder
//! steps that share a tier.

use crate::ops::{OperationDescriptor, StageTier};
use crate::registry::OperationRegistry;

/// Stable sort by tier.
pub fn canonical_order<T>(items: &mut [T], tier_of: impl Fn(&T) -> StageTier) {
    items.sort_by_key(|item| tier_of(item));
}

/// Registered descriptors bucketed by tier, tiers ascending, registration order within a tier.
pub fn group_by_tier(registry: &OperationRegistry) -> Vec<(StageTier, Vec<&OperationDescriptor>)> {
    StageTier::ALL
        .iter()
        .map(|&tier| (tier, registry.list(Some(tier), None)))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/stage.rs"]
mod tests;
