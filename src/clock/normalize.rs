use crate::error::{ClockError, ClockResult};
use crate::tree::{NodeId, Tree};

/// Tree-wide rate multiplier with a shadow copy for rollback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    current: f64,
    stored: f64,
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self {
            current: 1.0,
            stored: 1.0,
        }
    }
}

impl ScaleFactor {
    pub fn value(&self) -> f64 {
        self.current
    }

    pub fn set(&mut self, value: f64) {
        self.current = value;
    }

    pub fn store(&mut self) {
        self.stored = self.current;
    }

    pub fn restore(&mut self) {
        std::mem::swap(&mut self.current, &mut self.stored);
    }
}

/// Total branch time over the length-weighted category rate.
///
/// Multiplying every category rate by the result makes the length-weighted
/// mean rate over the non-root branches exactly one.
pub fn compute_scale_factor<F>(tree: &Tree, mut rate_of: F) -> ClockResult<f64>
where
    F: FnMut(NodeId) -> ClockResult<f64>,
{
    let mut tree_time = 0.0;
    let mut tree_rate = 0.0;
    for node in tree.branches() {
        let length = tree.branch_length(node);
        tree_time += length;
        tree_rate += rate_of(node)? * length;
    }

    if !(tree_time > 0.0 && tree_rate > 0.0 && tree_rate.is_finite()) {
        return Err(ClockError::Numeric(format!(
            "cannot normalize: total branch length {} and weighted rate {}",
            tree_time, tree_rate
        )));
    }
    Ok(tree_time / tree_rate)
}
