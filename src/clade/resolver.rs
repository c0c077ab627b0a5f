use super::CladeScan;
use crate::error::{ClockError, ClockResult};
use crate::tree::NodeId;
use tracing::debug;

/// Owning constraint of every node, by node id.
///
/// `None` means the node takes the background rate. Slot indices run
/// `0..clade_count` for constraints, with `clade_count` as the background slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipMap {
    owners: Vec<Option<usize>>,
    clade_count: usize,
}

impl OwnershipMap {
    /// Apply scanned constraints largest-first so nested clades overwrite
    /// their enclosing ones on shared nodes.
    pub fn resolve(scans: &[CladeScan], node_count: usize) -> ClockResult<Self> {
        let mut owners = vec![None; node_count];

        for clade in application_order(scans) {
            for &node in &scans[clade].nodes {
                let slot = owners.get_mut(node).ok_or_else(|| {
                    ClockError::Tree(format!(
                        "clade {} lists node {} but the tree has {} nodes",
                        clade, node, node_count
                    ))
                })?;
                *slot = Some(clade);
            }
        }

        let map = Self {
            owners,
            clade_count: scans.len(),
        };
        debug!(
            "Resolved ownership for {} nodes over {} clades ({} background)",
            node_count,
            map.clade_count,
            map.owners.iter().filter(|o| o.is_none()).count()
        );
        Ok(map)
    }

    pub fn owner(&self, node: NodeId) -> Option<usize> {
        self.owners.get(node).copied().flatten()
    }

    /// Mean-rate slot of a node: its owner, or the background slot.
    pub fn slot(&self, node: NodeId) -> usize {
        self.owner(node).unwrap_or(self.clade_count)
    }

    pub fn background_slot(&self) -> usize {
        self.clade_count
    }

    pub fn clade_count(&self) -> usize {
        self.clade_count
    }

    pub fn node_count(&self) -> usize {
        self.owners.len()
    }

    pub fn owned_by(&self, clade: usize) -> Vec<NodeId> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == Some(clade))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Clade indices by descending node-list length; ties keep declaration order.
pub fn application_order(scans: &[CladeScan]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scans.len()).collect();
    order.sort_by(|&a, &b| scans[b].nodes.len().cmp(&scans[a].nodes.len()));
    order
}
