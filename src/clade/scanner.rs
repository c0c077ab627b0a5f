use crate::taxa::Membership;
use crate::tree::{NodeId, Tree};

/// Result of scanning one constraint against the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CladeScan {
    /// Branches inside the clade, in post-order. Never contains the MRCA of a
    /// clade with more than one taxon, and never contains the root.
    pub nodes: Vec<NodeId>,
    /// First node whose subtree holds every declared taxon.
    pub mrca: Option<NodeId>,
    /// True when the MRCA subtree holds exactly the declared taxa.
    pub monophyletic: bool,
}

/// Collect the branches that belong to one clade in a single post-order pass.
///
/// Member leaves are always collected. An internal node is collected when it
/// holds some, but not all, of the declared taxa and has fewer descendant
/// leaves than the clade has taxa. The first node holding every declared
/// taxon is the MRCA: it is not collected, and nothing above it is either.
pub fn scan_clade(tree: &Tree, membership: &Membership) -> CladeScan {
    let target = membership.size;
    let n = tree.node_count();
    let mut leaves = vec![0usize; n];
    let mut matches = vec![0usize; n];
    let mut complete = vec![false; n];
    let mut nodes = Vec::new();
    let mut mrca = None;

    for id in tree.post_order() {
        match tree.children(id) {
            None => {
                leaves[id] = 1;
                if membership.in_clade[id] {
                    matches[id] = 1;
                    nodes.push(id);
                    if target == 1 {
                        complete[id] = true;
                        mrca = Some(id);
                    }
                }
            }
            Some((l, r)) => {
                leaves[id] = leaves[l] + leaves[r];
                if complete[l] || complete[r] {
                    complete[id] = true;
                    continue;
                }
                matches[id] = matches[l] + matches[r];
                if matches[id] == target {
                    complete[id] = true;
                    mrca = Some(id);
                } else if matches[id] > 0 && leaves[id] < target {
                    nodes.push(id);
                }
            }
        }
    }

    let monophyletic = mrca.is_some_and(|m| leaves[m] == target);
    CladeScan {
        nodes,
        mrca,
        monophyletic,
    }
}
