use crate::clade::CladeConstraint;
use crate::error::{ClockError, ClockResult};
use crate::tree::{NodeId, Tree};
use std::collections::HashMap;

/// Resolves taxon names to leaf nodes of one tree.
#[derive(Debug, Clone)]
pub struct TaxonSet {
    index: HashMap<String, NodeId>,
    names: Vec<String>,
    node_count: usize,
}

/// Leaves selected by one constraint, indexed by node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub in_clade: Vec<bool>,
    pub size: usize,
}

impl TaxonSet {
    pub fn from_tree(tree: &Tree) -> Self {
        let mut index = HashMap::with_capacity(tree.leaf_count());
        let mut names = Vec::with_capacity(tree.leaf_count());
        for leaf in tree.leaves() {
            if let Some(name) = tree.taxon(leaf) {
                index.insert(name.to_string(), leaf);
                names.push(name.to_string());
            }
        }
        Self {
            index,
            names,
            node_count: tree.node_count(),
        }
    }

    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Taxon names in leaf id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Mark the leaves a constraint declares. No declared list means every taxon.
    pub fn membership(&self, clade: &CladeConstraint) -> ClockResult<Membership> {
        let mut in_clade = vec![false; self.node_count];

        let declared = match &clade.taxa {
            None => {
                for &leaf in self.index.values() {
                    in_clade[leaf] = true;
                }
                return Ok(Membership {
                    in_clade,
                    size: self.index.len(),
                });
            }
            Some(declared) => declared,
        };

        if declared.is_empty() {
            return Err(ClockError::Config(format!(
                "clade '{}' declares an empty taxon list",
                clade.id
            )));
        }

        for taxon in declared {
            let leaf = self
                .resolve(taxon)
                .ok_or_else(|| ClockError::UnknownTaxon {
                    clade: clade.id.clone(),
                    taxon: taxon.clone(),
                })?;
            if in_clade[leaf] {
                return Err(ClockError::DuplicateTaxon {
                    clade: clade.id.clone(),
                    taxon: taxon.clone(),
                });
            }
            in_clade[leaf] = true;
        }

        Ok(Membership {
            in_clade,
            size: declared.len(),
        })
    }
}
