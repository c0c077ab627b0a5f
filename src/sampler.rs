use crate::clock::{BranchRateModel, Loggable};
use crate::config::SamplerParams;
use crate::error::{ClockError, ClockResult};
use crate::model::ClockModel;
use crate::tree::{NodeId, Tree};
use std::io::Write;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Category,
    MeanRate,
    StdDev,
    ClockRate,
    BaseRate,
    BranchLength,
}

/// What a rejected proposal must undo outside the model.
struct Undo {
    length: Option<(NodeId, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SamplerStats {
    pub steps: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub recalculations: usize,
    pub min_rate: f64,
    pub max_rate: f64,
}

/// Drives a model through store, propose, poll, evaluate and accept/reject
/// cycles with random proposals, checking every evaluated rate.
pub struct SyntheticSampler {
    params: SamplerParams,
    rng: fastrand::Rng,
}

impl SyntheticSampler {
    pub fn new(params: SamplerParams) -> Self {
        let rng = fastrand::Rng::with_seed(params.seed);
        Self { params, rng }
    }

    pub fn run(
        &mut self,
        model: &mut ClockModel,
        tree: &mut Tree,
        mut trace: Option<&mut dyn Write>,
    ) -> ClockResult<SamplerStats> {
        let mut stats = SamplerStats {
            min_rate: f64::INFINITY,
            max_rate: 0.0,
            ..Default::default()
        };

        if let Some(out) = trace.as_deref_mut() {
            model.init(out)?;
        }

        let moves = available_moves(model);
        let mut current = evaluate(model, tree, &mut stats)?;

        for step in 0..self.params.steps {
            model.store();
            let mv = moves[self.rng.usize(..moves.len())];
            let undo = self.propose(mv, model, tree)?;

            if model.requires_recalculation() {
                stats.recalculations += 1;
            }
            let proposed = evaluate(model, tree, &mut stats)?;

            if self.rng.f64() < self.params.accept_prob {
                stats.accepted += 1;
                current = proposed;
            } else {
                stats.rejected += 1;
                model.restore();
                if let Some((node, length)) = undo.length {
                    tree.set_branch_length(node, length)?;
                }
                let reverted = evaluate(model, tree, &mut stats)?;
                if let Some(node) = first_difference(&current, &reverted) {
                    return Err(ClockError::Numeric(format!(
                        "step {}: rejecting a {:?} move changed the rate of node {} from {} to {}",
                        step, mv, node, current[node], reverted[node]
                    )));
                }
            }
            stats.steps += 1;

            if self.params.log_every > 0 && step % self.params.log_every == 0 {
                if let Some(out) = trace.as_deref_mut() {
                    model.log(step as u64, out)?;
                }
            }
        }

        if let Some(out) = trace.as_deref_mut() {
            model.close(out)?;
        }
        info!(
            "Sampled {} steps: {} accepted, {} rejected",
            stats.steps, stats.accepted, stats.rejected
        );
        Ok(stats)
    }

    fn window_factor(&mut self) -> f64 {
        (self.params.rate_window * (2.0 * self.rng.f64() - 1.0)).exp()
    }

    fn propose(&mut self, mv: Move, model: &mut ClockModel, tree: &mut Tree) -> ClockResult<Undo> {
        let mut undo = Undo { length: None };
        match (mv, model) {
            (Move::Category, ClockModel::Relaxed(clock)) => {
                let categories = clock.categories_mut();
                let index = self.rng.usize(..categories.dimension());
                let value = self.rng.usize(categories.lower()..=categories.upper());
                categories.set_value(index, value)?;
            }
            (Move::MeanRate, ClockModel::Relaxed(clock)) => {
                let factor = self.window_factor();
                let rates = clock.mean_rates_mut();
                let slot = self.rng.usize(..rates.dimension());
                rates.set_value(slot, rates.value(slot)? * factor)?;
            }
            (Move::StdDev, ClockModel::Relaxed(clock)) => {
                let factor = self.window_factor();
                if let Some(sd) = clock.stddev_mut() {
                    sd.set_value(0, sd.value(0)? * factor)?;
                }
            }
            (Move::ClockRate, ClockModel::Strict(clock)) => {
                let factor = self.window_factor();
                let rates = clock.clock_rates_mut();
                let slot = self.rng.usize(..rates.dimension());
                rates.set_value(slot, rates.value(slot)? * factor)?;
            }
            (Move::BaseRate, ClockModel::Strict(clock)) => {
                let factor = self.window_factor();
                let base = clock.base_rate_mut();
                base.set_value(0, base.value(0)? * factor)?;
            }
            (Move::BranchLength, _) => {
                let branches: Vec<NodeId> = tree.branches().collect();
                let node = branches[self.rng.usize(..branches.len())];
                let old = tree.branch_length(node);
                let shift = self.params.length_window * (2.0 * self.rng.f64() - 1.0);
                tree.set_branch_length(node, (old + shift).abs())?;
                undo.length = Some((node, old));
            }
            (mv, model) => {
                debug!("{:?} does not apply to the {} clock", mv, model.name());
            }
        }
        Ok(undo)
    }
}

fn available_moves(model: &mut ClockModel) -> Vec<Move> {
    match model {
        ClockModel::Strict(_) => vec![Move::ClockRate, Move::BaseRate, Move::BranchLength],
        ClockModel::Relaxed(clock) => {
            let mut moves = vec![Move::Category, Move::MeanRate, Move::BranchLength];
            if clock.stddev_mut().is_some() {
                moves.push(Move::StdDev);
            }
            moves
        }
    }
}

/// Rates of every node, root included, checked for positivity.
fn evaluate(model: &mut ClockModel, tree: &Tree, stats: &mut SamplerStats) -> ClockResult<Vec<f64>> {
    let mut rates = Vec::with_capacity(tree.node_count());
    for node in 0..tree.node_count() {
        let rate = model.rate_for_branch(tree, node)?;
        if tree.is_root(node) {
            if rate != 1.0 {
                return Err(ClockError::Numeric(format!("root rate is {}, not 1", rate)));
            }
        } else {
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(ClockError::Numeric(format!(
                    "branch above node {} has rate {}",
                    node, rate
                )));
            }
            stats.min_rate = stats.min_rate.min(rate);
            stats.max_rate = stats.max_rate.max(rate);
        }
        rates.push(rate);
    }
    Ok(rates)
}

fn first_difference(a: &[f64], b: &[f64]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x.to_bits() != y.to_bits())
}
