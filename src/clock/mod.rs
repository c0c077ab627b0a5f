pub mod cache;
pub mod categories;
pub mod logger;
pub mod normalize;
pub mod relaxed;
pub mod strict;

pub use self::cache::DirtyFlags;
pub use self::categories::RateCategoryTable;
pub use self::normalize::ScaleFactor;
pub use self::relaxed::{CategoryMode, CladeRelaxedClock, RateSource, RelaxedClockParams};
pub use self::strict::CladeStrictClock;

use crate::error::ClockResult;
use crate::tree::{NodeId, Tree};
use std::io::Write;

/// What a sampler needs from a branch rate model.
pub trait BranchRateModel {
    /// Rate multiplier of the branch above `node`. The root always gets 1.
    fn rate_for_branch(&mut self, tree: &Tree, node: NodeId) -> ClockResult<f64>;

    /// Polled once per proposal. Marks cached state stale as a side effect.
    fn requires_recalculation(&mut self) -> bool;

    fn store(&mut self);

    fn restore(&mut self);
}

/// Tab-separated trace columns.
pub trait Loggable {
    fn columns(&self) -> Vec<String>;

    fn values(&self) -> Vec<f64>;

    fn init(&self, out: &mut dyn Write) -> ClockResult<()> {
        let mut w = logger::tsv_writer(out);
        w.write_record(self.columns())?;
        w.flush()?;
        Ok(())
    }

    fn log(&self, _sample: u64, out: &mut dyn Write) -> ClockResult<()> {
        let mut w = logger::tsv_writer(out);
        w.write_record(self.values().iter().map(|v| v.to_string()))?;
        w.flush()?;
        Ok(())
    }

    fn close(&self, out: &mut dyn Write) -> ClockResult<()> {
        out.flush()?;
        Ok(())
    }
}
