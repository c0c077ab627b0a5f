pub mod newick;

use crate::error::{ClockError, ClockResult};
use std::collections::HashSet;

/// Stable node number within one tree instance.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub parent: Option<NodeId>,
    pub children: Option<(NodeId, NodeId)>,
    /// Time span to the parent. Meaningless on the root.
    pub length: f64,
    pub taxon: Option<String>,
}

/// Rooted, fully bifurcating tree stored as a node arena.
///
/// Topology is fixed once built; only branch lengths may change afterwards.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: NodeId,
    leaf_count: usize,
}

impl Tree {
    /// Build a tree from parent indices (`None` marks the root).
    ///
    /// Children are ordered by ascending node id.
    pub fn from_structure(
        parents: &[Option<NodeId>],
        lengths: &[f64],
        taxa: &[Option<String>],
    ) -> ClockResult<Self> {
        let n = parents.len();
        if lengths.len() != n || taxa.len() != n {
            return Err(ClockError::Tree(format!(
                "parents ({}), lengths ({}) and taxa ({}) must have the same length",
                n,
                lengths.len(),
                taxa.len()
            )));
        }

        let mut child_lists: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for (id, parent) in parents.iter().enumerate() {
            if let Some(p) = *parent {
                if p >= n || p == id {
                    return Err(ClockError::Tree(format!(
                        "node {} has invalid parent {}",
                        id, p
                    )));
                }
                child_lists[p].push(id);
            }
        }

        let mut nodes = Vec::with_capacity(n);
        for (id, kids) in child_lists.into_iter().enumerate() {
            let children = match kids.as_slice() {
                [] => None,
                [l, r] => Some((*l, *r)),
                _ => {
                    return Err(ClockError::Tree(format!(
                        "node {} has {} children; only binary trees are supported",
                        id,
                        kids.len()
                    )))
                }
            };
            nodes.push(TreeNode {
                parent: parents[id],
                children,
                length: lengths[id],
                taxon: taxa[id].clone(),
            });
        }

        Self::assemble(nodes)
    }

    /// Parse a Newick string. See [`newick::parse_newick`] for the numbering scheme.
    pub fn from_newick(input: &str) -> ClockResult<Self> {
        newick::parse_newick(input)
    }

    pub(crate) fn assemble(mut nodes: Vec<TreeNode>) -> ClockResult<Self> {
        let n = nodes.len();
        if n < 3 {
            return Err(ClockError::Tree(
                "a tree needs at least two leaves".to_string(),
            ));
        }

        let roots: Vec<NodeId> = (0..n).filter(|&i| nodes[i].parent.is_none()).collect();
        let root = match roots.as_slice() {
            [r] => *r,
            [] => return Err(ClockError::Tree("tree has no root".to_string())),
            _ => {
                return Err(ClockError::Tree(format!(
                    "tree has {} roots: {:?}",
                    roots.len(),
                    roots
                )))
            }
        };

        let mut names = HashSet::new();
        let mut leaf_count = 0;
        for id in 0..n {
            let node = &nodes[id];
            if let Some((l, r)) = node.children {
                for c in [l, r] {
                    if c >= n || nodes[c].parent != Some(id) {
                        return Err(ClockError::Tree(format!(
                            "child {} of node {} does not point back to it",
                            c, id
                        )));
                    }
                }
            } else {
                let name = match node.taxon.as_deref() {
                    Some(name) if !name.is_empty() => name,
                    _ => return Err(ClockError::Tree(format!("leaf {} has no taxon name", id))),
                };
                if !names.insert(name.to_string()) {
                    return Err(ClockError::Tree(format!(
                        "taxon '{}' labels more than one leaf",
                        name
                    )));
                }
                leaf_count += 1;
            }
            if id != root && (!node.length.is_finite() || node.length < 0.0) {
                return Err(ClockError::Tree(format!(
                    "node {} has invalid branch length {}",
                    id, node.length
                )));
            }
        }

        for node in nodes.iter_mut().filter(|node| node.children.is_some()) {
            node.taxon = None;
        }

        let tree = Tree {
            nodes,
            root,
            leaf_count,
        };

        // Children point back to their parents, so only detached pieces can be missed here.
        if tree.post_order().len() != n {
            return Err(ClockError::Tree(
                "tree is not connected (cycle or detached nodes)".to_string(),
            ));
        }

        Ok(tree)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn check_node(&self, id: NodeId) -> ClockResult<()> {
        if id < self.nodes.len() {
            Ok(())
        } else {
            Err(ClockError::Tree(format!(
                "node {} does not exist (tree has {} nodes)",
                id,
                self.nodes.len()
            )))
        }
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id].children.is_none()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        self.nodes[id].children
    }

    pub fn branch_length(&self, id: NodeId) -> f64 {
        self.nodes[id].length
    }

    pub fn set_branch_length(&mut self, id: NodeId, length: f64) -> ClockResult<()> {
        self.check_node(id)?;
        if !length.is_finite() || length < 0.0 {
            return Err(ClockError::Tree(format!(
                "invalid branch length {} for node {}",
                length, id
            )));
        }
        self.nodes[id].length = length;
        Ok(())
    }

    pub fn taxon(&self, id: NodeId) -> Option<&str> {
        self.nodes[id].taxon.as_deref()
    }

    /// Leaf ids in ascending order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(move |&id| self.nodes[id].children.is_none())
    }

    /// Every node except the root, in ascending id order.
    pub fn branches(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(move |&id| id != self.root)
    }

    /// Children before parents, left subtree before right. Root is last.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, false)];

        while let Some((id, expanded)) = stack.pop() {
            match (expanded, self.nodes[id].children) {
                (false, Some((l, r))) => {
                    stack.push((id, true));
                    stack.push((r, false));
                    stack.push((l, false));
                }
                _ => order.push(id),
            }
        }
        order
    }
}
