pub mod clade;
pub mod clock;
pub mod config;
pub mod distribution;
pub mod error;
pub mod model;
pub mod parameter;
pub mod sampler;
pub mod taxa;
pub mod tree;

pub use crate::clock::{BranchRateModel, Loggable};
pub use crate::error::{ClockError, ClockResult};
pub use crate::model::{ClockModel, ModelDefinition};
pub use crate::tree::{NodeId, Tree};
