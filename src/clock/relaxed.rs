use super::cache::DirtyFlags;
use super::categories::RateCategoryTable;
use super::logger::slot_columns;
use super::normalize::{compute_scale_factor, ScaleFactor};
use super::{BranchRateModel, Loggable};
use crate::clade::{collect_calibrations, partition, CladeConstraint, MonophylyPolicy, OwnershipMap};
use crate::distribution::{LogNormal, RateDistribution};
use crate::error::{ClockError, ClockResult};
use crate::parameter::{IntegerParameter, RealParameter};
use crate::taxa::TaxonSet;
use crate::tree::{NodeId, Tree};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

const MEAN_TOLERANCE: f64 = 1e-6;

/// How branches map onto entries of the category parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CategoryMode {
    /// One entry per non-root branch, indexed by node id.
    PerBranch,
    /// One entry per clade slot plus the background slot.
    PerClade,
}

/// Where the discretized rates come from.
#[derive(Debug)]
pub enum RateSource {
    Fixed(Box<dyn RateDistribution>),
    /// Unit-mean log-normal whose log-space sigma is a sampled parameter.
    LogNormalStdDev(RealParameter),
}

impl RateSource {
    fn is_dirty(&self) -> bool {
        match self {
            RateSource::Fixed(_) => false,
            RateSource::LogNormalStdDev(p) => p.is_dirty(),
        }
    }

    fn build_table(&self, k: usize) -> ClockResult<RateCategoryTable> {
        match self {
            RateSource::Fixed(dist) => RateCategoryTable::build(dist.as_ref(), k),
            RateSource::LogNormalStdDev(p) => {
                RateCategoryTable::build(&LogNormal::with_unit_mean(p.value(0)?)?, k)
            }
        }
    }

    fn rebuild_table(&self, table: &mut RateCategoryTable) -> ClockResult<()> {
        match self {
            RateSource::Fixed(dist) => table.rebuild(dist.as_ref()),
            RateSource::LogNormalStdDev(p) => {
                table.rebuild(&LogNormal::with_unit_mean(p.value(0)?)?)
            }
        }
    }

    fn mean(&self) -> Option<f64> {
        match self {
            RateSource::Fixed(dist) => dist.mean(),
            RateSource::LogNormalStdDev(_) => Some(1.0),
        }
    }

    fn store(&mut self) {
        if let RateSource::LogNormalStdDev(p) = self {
            p.store();
        }
    }

    fn restore(&mut self) {
        if let RateSource::LogNormalStdDev(p) = self {
            p.restore();
        }
    }
}

#[derive(TypedBuilder)]
pub struct RelaxedClockParams<'a> {
    pub tree: &'a Tree,
    pub clades: Vec<CladeConstraint>,
    pub source: RateSource,
    pub mean_rate: RealParameter,
    /// Overwritten with the initial assignment; a fresh one is made if absent.
    #[builder(default, setter(strip_option))]
    pub categories: Option<IntegerParameter>,
    #[builder(default = CategoryMode::PerBranch)]
    pub mode: CategoryMode,
    /// Category count. Zero or negative picks the default for the mode.
    #[builder(default = -1)]
    pub discrete_rates: i64,
    #[builder(default = false)]
    pub normalize: bool,
    #[builder(default = MonophylyPolicy::Warn)]
    pub monophyly: MonophylyPolicy,
}

impl RelaxedClockParams<'_> {
    pub fn build_clock(self) -> ClockResult<CladeRelaxedClock> {
        let tree = self.tree;
        let policy = self.monophyly;
        let mode = self.mode;

        let clades = collect_calibrations(&self.clades, policy)?;
        let taxa = TaxonSet::from_tree(tree);
        let ownership = partition(tree, &taxa, &clades, policy)?.ownership;

        let node_count = tree.node_count();
        let slots = clades.len() + 1;
        let (dimension, default_k) = match mode {
            CategoryMode::PerBranch => (node_count - 1, node_count - 1),
            CategoryMode::PerClade => (slots, node_count),
        };
        let k = if self.discrete_rates <= 0 {
            default_k
        } else {
            self.discrete_rates as usize
        };

        let initial: Vec<usize> = (0..dimension).map(|i| i % k).collect();
        let mut categories = match self.categories {
            Some(p) => p,
            None => IntegerParameter::new("rateCategories", vec![0], 0, 0)?,
        };
        categories.reset(initial, 0, k - 1)?;

        // A single value is the shared default; anything else must match the slots exactly.
        let mut mean_rate = self.mean_rate;
        match mean_rate.dimension() {
            d if d == slots => {}
            1 => mean_rate.resize(slots)?,
            d => {
                return Err(ClockError::Config(format!(
                    "'{}' has {} values but the clock has {} rate slots ({} clades plus root)",
                    mean_rate.id(),
                    d,
                    slots,
                    clades.len()
                )))
            }
        }

        let source = self.source;
        if let Some(mean) = source.mean() {
            if (mean - 1.0).abs() > MEAN_TOLERANCE {
                warn!(
                    "Rate distribution has mean {} instead of 1; rates are scaled by '{}' only",
                    mean,
                    mean_rate.id()
                );
            }
        }
        let table = source.build_table(k)?;

        for (slot, clade) in clades.iter().enumerate() {
            info!("{}[{}] is the mean rate of clade '{}'", mean_rate.id(), slot, clade.id);
        }
        info!("{}[{}] is the background (root) rate", mean_rate.id(), slots - 1);
        debug!(
            "Relaxed clade clock: {} categories over {} entries ({})",
            k, dimension, mode
        );

        let flags = DirtyFlags::initial(self.normalize);
        Ok(CladeRelaxedClock {
            clades,
            policy,
            ownership: Some(ownership),
            mode,
            source,
            categories,
            mean_rate,
            table,
            scale: ScaleFactor::default(),
            normalize: self.normalize,
            flags,
            stored_flags: flags,
            pending_change: false,
        })
    }
}

/// Discretized relaxed clock with per-clade mean rates.
#[derive(Debug)]
pub struct CladeRelaxedClock {
    clades: Vec<CladeConstraint>,
    policy: MonophylyPolicy,
    ownership: Option<OwnershipMap>,
    mode: CategoryMode,
    source: RateSource,
    categories: IntegerParameter,
    mean_rate: RealParameter,
    table: RateCategoryTable,
    scale: ScaleFactor,
    normalize: bool,
    flags: DirtyFlags,
    stored_flags: DirtyFlags,
    pending_change: bool,
}

impl CladeRelaxedClock {
    pub fn clades(&self) -> &[CladeConstraint] {
        &self.clades
    }

    pub fn mode(&self) -> CategoryMode {
        self.mode
    }

    pub fn ownership(&self) -> Option<&OwnershipMap> {
        self.ownership.as_ref()
    }

    pub fn table(&self) -> &RateCategoryTable {
        &self.table
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale.value()
    }

    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    pub fn categories(&self) -> &IntegerParameter {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut IntegerParameter {
        &mut self.categories
    }

    pub fn mean_rates(&self) -> &RealParameter {
        &self.mean_rate
    }

    pub fn mean_rates_mut(&mut self) -> &mut RealParameter {
        &mut self.mean_rate
    }

    pub fn stddev_mut(&mut self) -> Option<&mut RealParameter> {
        match &mut self.source {
            RateSource::LogNormalStdDev(p) => Some(p),
            RateSource::Fixed(_) => None,
        }
    }

    /// Replace a fixed distribution. The table is rebuilt on the next query,
    /// also after a rollback.
    pub fn set_distribution(&mut self, dist: Box<dyn RateDistribution>) -> ClockResult<()> {
        match &mut self.source {
            RateSource::Fixed(current) => {
                debug!("Replacing {} rate distribution with {}", current.name(), dist.name());
                *current = dist;
            }
            RateSource::LogNormalStdDev(p) => {
                return Err(ClockError::Config(format!(
                    "rates are driven by '{}'; there is no fixed distribution to replace",
                    p.id()
                )))
            }
        }
        self.flags.mark_table();
        self.stored_flags.mark_table();
        self.pending_change = true;
        Ok(())
    }

    /// Forget branch ownership; it is rebuilt from the tree on the next query.
    pub fn invalidate_topology(&mut self) {
        self.ownership = None;
        if self.normalize {
            self.flags.scale = true;
        }
    }

    /// Index into the category parameter used by `node`.
    pub fn category_index(&self, tree: &Tree, node: NodeId) -> ClockResult<usize> {
        let ownership = self.ownership_map()?;
        Ok(match self.mode {
            CategoryMode::PerBranch => {
                if node == self.categories.dimension() {
                    tree.root()
                } else {
                    node
                }
            }
            CategoryMode::PerClade => ownership.slot(node),
        })
    }

    /// Discretized rate of `node` before scaling and mean rates.
    pub fn category_rate(&self, tree: &Tree, node: NodeId) -> ClockResult<f64> {
        let category = self.categories.value(self.category_index(tree, node)?)?;
        self.table.rate(category)
    }

    fn ownership_map(&self) -> ClockResult<&OwnershipMap> {
        self.ownership.as_ref().ok_or_else(|| {
            ClockError::Tree("branch ownership has not been resolved".to_string())
        })
    }

    fn refresh(&mut self, tree: &Tree) -> ClockResult<()> {
        match &self.ownership {
            Some(map) if map.node_count() != tree.node_count() => {
                return Err(ClockError::Tree(format!(
                    "tree has {} nodes but ownership was resolved for {}",
                    tree.node_count(),
                    map.node_count()
                )))
            }
            Some(_) => {}
            None => {
                let taxa = TaxonSet::from_tree(tree);
                let part = partition(tree, &taxa, &self.clades, self.policy)?;
                self.ownership = Some(part.ownership);
            }
        }

        if self.flags.table {
            self.source.rebuild_table(&mut self.table)?;
            self.flags.table_rebuilt();
        }

        if self.normalize && self.flags.scale {
            let factor = compute_scale_factor(tree, |node| self.category_rate(tree, node))?;
            debug!("Normalization scale factor {}", factor);
            self.scale.set(factor);
            self.flags.scale_recomputed();
        }
        Ok(())
    }
}

impl BranchRateModel for CladeRelaxedClock {
    fn rate_for_branch(&mut self, tree: &Tree, node: NodeId) -> ClockResult<f64> {
        tree.check_node(node)?;
        if tree.is_root(node) {
            return Ok(1.0);
        }
        self.refresh(tree)?;

        let slot = self.ownership_map()?.slot(node);
        let rate = self.category_rate(tree, node)?;
        Ok(rate * self.scale.value() * self.mean_rate.value(slot)?)
    }

    fn requires_recalculation(&mut self) -> bool {
        let distribution_changed = self.source.is_dirty() || self.pending_change;
        self.pending_change = false;
        self.flags.poll(self.normalize, distribution_changed);
        distribution_changed || self.categories.is_dirty() || self.mean_rate.is_dirty()
    }

    fn store(&mut self) {
        self.table.store();
        self.scale.store();
        self.categories.store();
        self.mean_rate.store();
        self.source.store();
        self.stored_flags = self.flags;
    }

    fn restore(&mut self) {
        self.table.restore();
        self.scale.restore();
        self.categories.restore();
        self.mean_rate.restore();
        self.source.restore();
        self.flags = self.stored_flags;
    }
}

impl Loggable for CladeRelaxedClock {
    fn columns(&self) -> Vec<String> {
        slot_columns(self.mean_rate.id(), &self.clades)
    }

    fn values(&self) -> Vec<f64> {
        self.mean_rate.values().to_vec()
    }
}
