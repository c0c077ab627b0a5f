#![allow(dead_code)]

use cladeclock::clade::{CladeConstraint, MonophylyPolicy};
use cladeclock::clock::{CategoryMode, CladeRelaxedClock, RateSource, RelaxedClockParams};
use cladeclock::distribution::Uniform;
use cladeclock::parameter::RealParameter;
use cladeclock::{BranchRateModel, Tree};

/// A0 B1 C2 D3 E4, (A,B)=5, ((A,B),C)=6, (D,E)=7, root=8
pub const FIVE_TAXA: &str = "(((A:1,B:1):1,C:2):1,(D:1,E:1.5):2);";

/// A0 B1 C2 D3, (A,B)=4, (C,D)=5, root=6
pub const FOUR_TAXA: &str = "((A:1,B:2):0.5,(C:1,D:3):0.25);";

pub fn tree(newick: &str) -> Tree {
    Tree::from_newick(newick).unwrap()
}

pub fn mean_rate(values: &[f64]) -> RealParameter {
    RealParameter::positive("meanRate", values.to_vec()).unwrap()
}

pub fn uniform_source() -> RateSource {
    RateSource::Fixed(Box::new(Uniform::new(0.0, 2.0).unwrap()))
}

pub fn stddev_source(sd: f64) -> RateSource {
    RateSource::LogNormalStdDev(RealParameter::positive("rateStdDev", vec![sd]).unwrap())
}

/// Per-branch relaxed clock over a fixed uniform distribution.
pub fn relaxed(tree: &Tree, clades: Vec<CladeConstraint>, normalize: bool) -> CladeRelaxedClock {
    RelaxedClockParams::builder()
        .tree(tree)
        .clades(clades)
        .source(uniform_source())
        .mean_rate(mean_rate(&[1.0]))
        .normalize(normalize)
        .build()
        .build_clock()
        .unwrap()
}

/// Per-clade log-normal clock with a sampled standard deviation.
pub fn log_normal(
    tree: &Tree,
    clades: Vec<CladeConstraint>,
    sd: f64,
    normalize: bool,
) -> CladeRelaxedClock {
    RelaxedClockParams::builder()
        .tree(tree)
        .clades(clades)
        .source(stddev_source(sd))
        .mean_rate(mean_rate(&[1.0]))
        .mode(CategoryMode::PerClade)
        .normalize(normalize)
        .monophyly(MonophylyPolicy::Warn)
        .build()
        .build_clock()
        .unwrap()
}

/// Rate of every node, root included.
pub fn all_rates<M: BranchRateModel>(model: &mut M, tree: &Tree) -> Vec<f64> {
    (0..tree.node_count())
        .map(|n| model.rate_for_branch(tree, n).unwrap())
        .collect()
}

pub fn weighted_mean(tree: &Tree, rates: &[f64]) -> f64 {
    let time: f64 = tree.branches().map(|n| tree.branch_length(n)).sum();
    let weighted: f64 = tree
        .branches()
        .map(|n| rates[n] * tree.branch_length(n))
        .sum();
    weighted / time
}
