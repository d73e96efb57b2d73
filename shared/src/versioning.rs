//! Quotation version chains
//!
//! Revisions point at the root of their chain through `parent_id`. Walks are
//! bounded and fail closed on cycles or dangling links.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::QuotationStatus;

/// Longest parent walk accepted before the chain is declared corrupt
pub const MAX_CHAIN_DEPTH: usize = 64;

/// One quotation as seen by chain operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainNode {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub version: i32,
    pub status: QuotationStatus,
    pub is_locked: bool,
}

/// Walk `parent_id` links from `start` to the chain root.
///
/// `links` maps each known quotation id to its parent.
pub fn resolve_root(start: Uuid, links: &HashMap<Uuid, Option<Uuid>>) -> DomainResult<Uuid> {
    let mut visited = HashSet::new();
    let mut current = start;

    loop {
        if !visited.insert(current) || visited.len() > MAX_CHAIN_DEPTH {
            return Err(DomainError::VersionCycle(start));
        }
        match links.get(&current) {
            None => return Err(DomainError::BrokenChain(current)),
            Some(None) => return Ok(current),
            Some(Some(parent)) => current = *parent,
        }
    }
}

/// Version for a new revision: one past the highest version in the chain
pub fn next_version(versions: impl IntoIterator<Item = i32>) -> i32 {
    versions.into_iter().max().map_or(1, |max| max + 1)
}

/// A new revision may only be added while no version has been approved
pub fn ensure_revisable(chain: &[ChainNode]) -> DomainResult<()> {
    match chain
        .iter()
        .find(|n| matches!(n.status, QuotationStatus::Approved | QuotationStatus::Converted))
    {
        Some(node) => Err(DomainError::InvalidTransition {
            from: node.status.to_string(),
            to: "new version".to_string(),
        }),
        None => Ok(()),
    }
}
