use crate::clade::{CladeConstraint, OwnershipMap};
use crate::clock::{
    BranchRateModel, CategoryMode, CladeRelaxedClock, CladeStrictClock, Loggable, RateSource,
    RelaxedClockParams,
};
use crate::config::ClockOptions;
use crate::distribution::DistributionSpec;
use crate::error::{ClockError, ClockResult};
use crate::parameter::RealParameter;
use crate::tree::{NodeId, Tree};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A model definition file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    /// Newick string.
    pub tree: String,
    #[serde(default)]
    pub clades: Vec<CladeConstraint>,
    #[serde(default = "default_mean_rate_id")]
    pub mean_rate_id: String,
    pub clock: ClockSpec,
    #[serde(default)]
    pub options: ClockOptions,
}

fn default_mean_rate_id() -> String {
    "meanRate".to_string()
}

fn unit() -> f64 {
    1.0
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClockSpec {
    Strict {
        clock_rates: Vec<f64>,
        #[serde(default = "unit")]
        base_rate: f64,
    },
    Relaxed {
        distribution: DistributionSpec,
        #[serde(default)]
        mean_rates: Option<Vec<f64>>,
    },
    LogNormal {
        std_dev: f64,
        #[serde(default)]
        mean_rates: Option<Vec<f64>>,
    },
}

impl ModelDefinition {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ClockResult<Self> {
        let content = fs::read_to_string(path)?;
        let def: ModelDefinition = serde_json::from_str(&content)?;
        Ok(def)
    }

    pub fn parse_tree(&self) -> ClockResult<Tree> {
        Tree::from_newick(&self.tree)
    }

    pub fn build(&self, tree: &Tree, options: &ClockOptions) -> ClockResult<ClockModel> {
        debug!("Building {:?} clock over {} clades", self.clock, self.clades.len());
        match &self.clock {
            ClockSpec::Strict {
                clock_rates,
                base_rate,
            } => {
                let rates = RealParameter::positive("clockRate", clock_rates.clone())?;
                let base = RealParameter::positive("baseRate", vec![*base_rate])?;
                Ok(ClockModel::Strict(CladeStrictClock::new(
                    tree,
                    &self.clades,
                    rates,
                    base,
                )?))
            }
            ClockSpec::Relaxed {
                distribution,
                mean_rates,
            } => {
                let source = RateSource::Fixed(distribution.build()?);
                self.relaxed(tree, options, source, mean_rates, CategoryMode::PerBranch)
            }
            ClockSpec::LogNormal {
                std_dev,
                mean_rates,
            } => {
                let sd = RealParameter::positive("rateStdDev", vec![*std_dev])?;
                let source = RateSource::LogNormalStdDev(sd);
                self.relaxed(tree, options, source, mean_rates, CategoryMode::PerClade)
            }
        }
    }

    fn relaxed(
        &self,
        tree: &Tree,
        options: &ClockOptions,
        source: RateSource,
        mean_rates: &Option<Vec<f64>>,
        mode: CategoryMode,
    ) -> ClockResult<ClockModel> {
        let values = mean_rates.clone().unwrap_or_else(|| vec![1.0]);
        let mean_rate = RealParameter::positive(&self.mean_rate_id, values)?;
        let clock = RelaxedClockParams::builder()
            .tree(tree)
            .clades(self.clades.clone())
            .source(source)
            .mean_rate(mean_rate)
            .mode(mode)
            .discrete_rates(options.discrete_rates)
            .normalize(options.normalize)
            .monophyly(options.monophyly)
            .build()
            .build_clock()?;
        Ok(ClockModel::Relaxed(clock))
    }
}

#[derive(Debug)]
pub enum ClockModel {
    Strict(CladeStrictClock),
    Relaxed(CladeRelaxedClock),
}

impl ClockModel {
    pub fn name(&self) -> String {
        match self {
            ClockModel::Strict(_) => "strict".to_string(),
            ClockModel::Relaxed(c) => format!("relaxed ({})", c.mode()),
        }
    }

    pub fn clades(&self) -> &[CladeConstraint] {
        match self {
            ClockModel::Strict(c) => c.clades(),
            ClockModel::Relaxed(c) => c.clades(),
        }
    }

    pub fn ownership(&self) -> Option<&OwnershipMap> {
        match self {
            ClockModel::Strict(c) => Some(c.ownership()),
            ClockModel::Relaxed(c) => c.ownership(),
        }
    }

    /// Rate category assigned to `node`, for clocks that have categories.
    pub fn category_of(&self, tree: &Tree, node: NodeId) -> ClockResult<Option<usize>> {
        tree.check_node(node)?;
        match self {
            ClockModel::Relaxed(c) if !tree.is_root(node) => {
                let index = c.category_index(tree, node)?;
                c.categories().value(index).map(Some)
            }
            _ => Ok(None),
        }
    }
}

impl BranchRateModel for ClockModel {
    fn rate_for_branch(&mut self, tree: &Tree, node: NodeId) -> ClockResult<f64> {
        match self {
            ClockModel::Strict(c) => c.rate_for_branch(tree, node),
            ClockModel::Relaxed(c) => c.rate_for_branch(tree, node),
        }
    }

    fn requires_recalculation(&mut self) -> bool {
        match self {
            ClockModel::Strict(c) => c.requires_recalculation(),
            ClockModel::Relaxed(c) => c.requires_recalculation(),
        }
    }

    fn store(&mut self) {
        match self {
            ClockModel::Strict(c) => c.store(),
            ClockModel::Relaxed(c) => c.store(),
        }
    }

    fn restore(&mut self) {
        match self {
            ClockModel::Strict(c) => c.restore(),
            ClockModel::Relaxed(c) => c.restore(),
        }
    }
}

impl Loggable for ClockModel {
    fn columns(&self) -> Vec<String> {
        match self {
            ClockModel::Strict(c) => c.columns(),
            ClockModel::Relaxed(c) => c.columns(),
        }
    }

    fn values(&self) -> Vec<f64> {
        match self {
            ClockModel::Strict(c) => c.values(),
            ClockModel::Relaxed(c) => c.values(),
        }
    }
}

impl TryFrom<&str> for ModelDefinition {
    type Error = ClockError;

    fn try_from(json: &str) -> ClockResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
