use super::logger::slot_columns;
use super::{BranchRateModel, Loggable};
use crate::clade::{collect_calibrations, partition, CladeConstraint, MonophylyPolicy, OwnershipMap};
use crate::error::{ClockError, ClockResult};
use crate::parameter::RealParameter;
use crate::taxa::TaxonSet;
use crate::tree::{NodeId, Tree};
use tracing::info;

/// One free rate per monophyletic clade, a base rate everywhere else.
#[derive(Debug, Clone)]
pub struct CladeStrictClock {
    clades: Vec<CladeConstraint>,
    ownership: OwnershipMap,
    clock_rates: RealParameter,
    base_rate: RealParameter,
}

impl CladeStrictClock {
    pub fn new(
        tree: &Tree,
        clades: &[CladeConstraint],
        clock_rates: RealParameter,
        base_rate: RealParameter,
    ) -> ClockResult<Self> {
        if clades.is_empty() {
            return Err(ClockError::Config(
                "a strict clade clock needs at least one clade".to_string(),
            ));
        }
        let clades = collect_calibrations(clades, MonophylyPolicy::Require)?;
        if clock_rates.dimension() != clades.len() {
            return Err(ClockError::Config(format!(
                "'{}' has {} rates for {} clades",
                clock_rates.id(),
                clock_rates.dimension(),
                clades.len()
            )));
        }

        let taxa = TaxonSet::from_tree(tree);
        let ownership = partition(tree, &taxa, &clades, MonophylyPolicy::Require)?.ownership;

        for (slot, clade) in clades.iter().enumerate() {
            info!("{}[{}] is the rate of clade '{}'", clock_rates.id(), slot, clade.id);
        }

        Ok(Self {
            clades,
            ownership,
            clock_rates,
            base_rate,
        })
    }

    pub fn clades(&self) -> &[CladeConstraint] {
        &self.clades
    }

    pub fn ownership(&self) -> &OwnershipMap {
        &self.ownership
    }

    pub fn clock_rates_mut(&mut self) -> &mut RealParameter {
        &mut self.clock_rates
    }

    pub fn base_rate_mut(&mut self) -> &mut RealParameter {
        &mut self.base_rate
    }
}

impl BranchRateModel for CladeStrictClock {
    fn rate_for_branch(&mut self, tree: &Tree, node: NodeId) -> ClockResult<f64> {
        tree.check_node(node)?;
        if tree.is_root(node) {
            return Ok(1.0);
        }
        match self.ownership.owner(node) {
            Some(clade) => self.clock_rates.value(clade),
            None => self.base_rate.value(0),
        }
    }

    fn requires_recalculation(&mut self) -> bool {
        self.clock_rates.is_dirty() || self.base_rate.is_dirty()
    }

    fn store(&mut self) {
        self.clock_rates.store();
        self.base_rate.store();
    }

    fn restore(&mut self) {
        self.clock_rates.restore();
        self.base_rate.restore();
    }
}

impl Loggable for CladeStrictClock {
    fn columns(&self) -> Vec<String> {
        slot_columns(self.clock_rates.id(), &self.clades)
    }

    fn values(&self) -> Vec<f64> {
        let mut values = self.clock_rates.values().to_vec();
        values.push(self.base_rate.values()[0]);
        values
    }
}
