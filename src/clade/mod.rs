pub mod resolver;
pub mod scanner;

pub use self::resolver::OwnershipMap;
pub use self::scanner::{scan_clade, CladeScan};

use crate::error::{ClockError, ClockResult};
use crate::taxa::TaxonSet;
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, warn};

/// A named taxon subset whose branches share one rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CladeConstraint {
    pub id: String,
    /// `None` selects every taxon in the tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxa: Option<Vec<String>>,
    #[serde(default = "default_monophyletic")]
    pub monophyletic: bool,
}

fn default_monophyletic() -> bool {
    true
}

impl CladeConstraint {
    pub fn new(id: &str, taxa: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            taxa: Some(taxa.iter().map(|t| t.to_string()).collect()),
            monophyletic: true,
        }
    }

    pub fn all_taxa(id: &str) -> Self {
        Self {
            id: id.to_string(),
            taxa: None,
            monophyletic: true,
        }
    }

    pub fn with_monophyletic(mut self, monophyletic: bool) -> Self {
        self.monophyletic = monophyletic;
        self
    }

    /// Column label for trace output: the id without a trailing `.prior`.
    pub fn log_label(&self) -> &str {
        self.id.strip_suffix(".prior").unwrap_or(&self.id)
    }
}

/// How a model treats constraints that are not monophyletic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MonophylyPolicy {
    /// Hard configuration error.
    Require,
    /// Log a warning and carry on.
    Warn,
}

/// Every constraint scanned against one topology, plus the resolved owners.
#[derive(Debug, Clone)]
pub struct CladePartition {
    pub scans: Vec<CladeScan>,
    pub ownership: OwnershipMap,
}

/// Pick the constraints a model will use.
///
/// Repeated ids keep their first declaration. Constraints not flagged
/// monophyletic are an error under [`MonophylyPolicy::Require`] and are
/// dropped with a warning under [`MonophylyPolicy::Warn`].
pub fn collect_calibrations(
    declared: &[CladeConstraint],
    policy: MonophylyPolicy,
) -> ClockResult<Vec<CladeConstraint>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(declared.len());

    for clade in declared {
        if !seen.insert(clade.id.as_str()) {
            debug!("Skipping repeated declaration of clade '{}'", clade.id);
            continue;
        }
        if !clade.monophyletic {
            match policy {
                MonophylyPolicy::Require => {
                    return Err(ClockError::NotMonophyletic(clade.id.clone()))
                }
                MonophylyPolicy::Warn => {
                    warn!("Calibration that is not monophyletic found: {}", clade.id);
                    continue;
                }
            }
        }
        out.push(clade.clone());
    }
    Ok(out)
}

/// Scan every constraint and resolve branch ownership.
///
/// Taxon resolution failures always abort. A constraint whose taxa do not
/// form a clade of `tree` aborts under `Require`; under `Warn` it keeps the
/// node set the scan derived.
pub fn partition(
    tree: &Tree,
    taxa: &TaxonSet,
    clades: &[CladeConstraint],
    policy: MonophylyPolicy,
) -> ClockResult<CladePartition> {
    let mut scans = Vec::with_capacity(clades.len());
    for clade in clades {
        let membership = taxa.membership(clade)?;
        let scan = scan_clade(tree, &membership);
        if !scan.monophyletic {
            match policy {
                MonophylyPolicy::Require => {
                    return Err(ClockError::NotMonophyletic(clade.id.clone()))
                }
                MonophylyPolicy::Warn => warn!(
                    "Taxa of clade '{}' do not form a clade in the tree; using the {} branches they induce",
                    clade.id,
                    scan.nodes.len()
                ),
            }
        }
        debug!(
            "Clade '{}': {} taxa, {} branches, MRCA {:?}",
            clade.id,
            membership.size,
            scan.nodes.len(),
            scan.mrca
        );
        scans.push(scan);
    }

    let ownership = OwnershipMap::resolve(&scans, tree.node_count())?;
    Ok(CladePartition { scans, ownership })
}
