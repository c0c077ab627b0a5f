use crate::error::{ClockError, ClockResult};
use std::fmt::Debug;

/// A bounded, multi-dimensional sampler parameter with per-element dirty flags.
///
/// Writes mark elements dirty. `store` snapshots the values and clears the
/// flags; `restore` rolls back to the snapshot and clears the flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter<T> {
    id: String,
    values: Vec<T>,
    stored: Vec<T>,
    lower: T,
    upper: T,
    dirty: Vec<bool>,
}

pub type RealParameter = Parameter<f64>;
pub type IntegerParameter = Parameter<usize>;

impl<T: Copy + PartialOrd + Debug> Parameter<T> {
    pub fn new(id: &str, values: Vec<T>, lower: T, upper: T) -> ClockResult<Self> {
        if values.is_empty() {
            return Err(ClockError::Parameter(format!("parameter '{}' has no values", id)));
        }
        let mut param = Self {
            id: id.to_string(),
            stored: values.clone(),
            dirty: vec![false; values.len()],
            values,
            lower,
            upper,
        };
        param.set_bounds(lower, upper)?;
        Ok(param)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn lower(&self) -> T {
        self.lower
    }

    pub fn upper(&self) -> T {
        self.upper
    }

    pub fn value(&self, index: usize) -> ClockResult<T> {
        self.values.get(index).copied().ok_or_else(|| {
            ClockError::Parameter(format!(
                "index {} out of range for '{}' (dimension {})",
                index,
                self.id,
                self.values.len()
            ))
        })
    }

    pub fn set_value(&mut self, index: usize, value: T) -> ClockResult<()> {
        self.value(index)?;
        self.check_bounds(value)?;
        self.values[index] = value;
        self.dirty[index] = true;
        Ok(())
    }

    /// Replace the bounds. Every current value must already lie inside them.
    pub fn set_bounds(&mut self, lower: T, upper: T) -> ClockResult<()> {
        if !(lower <= upper) {
            return Err(ClockError::Parameter(format!(
                "'{}' has lower bound {:?} above upper bound {:?}",
                self.id, lower, upper
            )));
        }
        if let Some(v) = self.values.iter().find(|&&v| !within(v, lower, upper)) {
            return Err(ClockError::Parameter(format!(
                "value {:?} outside [{:?}, {:?}] for '{}'",
                v, lower, upper, self.id
            )));
        }
        self.lower = lower;
        self.upper = upper;
        Ok(())
    }

    /// Overwrite dimension, values and bounds in one step. The new state is
    /// also the stored state.
    pub fn reset(&mut self, values: Vec<T>, lower: T, upper: T) -> ClockResult<()> {
        if values.is_empty() {
            return Err(ClockError::Parameter(format!(
                "parameter '{}' has no values",
                self.id
            )));
        }
        let previous = std::mem::replace(&mut self.values, values);
        if let Err(e) = self.set_bounds(lower, upper) {
            self.values = previous;
            return Err(e);
        }
        self.stored = self.values.clone();
        self.dirty = vec![false; self.values.len()];
        Ok(())
    }

    /// Change the dimension, repeating the existing values cyclically.
    pub fn resize(&mut self, dimension: usize) -> ClockResult<()> {
        if dimension == 0 {
            return Err(ClockError::Parameter(format!(
                "cannot resize '{}' to dimension 0",
                self.id
            )));
        }
        let old = self.values.len();
        self.values = (0..dimension).map(|i| self.values[i % old]).collect();
        self.stored = self.values.clone();
        self.dirty = vec![false; dimension];
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|&d| d)
    }

    pub fn is_dirty_at(&self, index: usize) -> bool {
        self.dirty.get(index).copied().unwrap_or(false)
    }

    pub fn store(&mut self) {
        self.stored.copy_from_slice(&self.values);
        self.dirty.fill(false);
    }

    pub fn restore(&mut self) {
        self.values.copy_from_slice(&self.stored);
        self.dirty.fill(false);
    }

    fn check_bounds(&self, value: T) -> ClockResult<()> {
        if within(value, self.lower, self.upper) {
            Ok(())
        } else {
            Err(ClockError::Parameter(format!(
                "value {:?} outside [{:?}, {:?}] for '{}'",
                value, self.lower, self.upper, self.id
            )))
        }
    }
}

// Written so NaN fails too.
fn within<T: PartialOrd>(value: T, lower: T, upper: T) -> bool {
    value >= lower && value <= upper
}

impl RealParameter {
    /// Strictly positive real parameter, as used for rates and scales.
    pub fn positive(id: &str, values: Vec<f64>) -> ClockResult<Self> {
        Self::new(id, values, f64::MIN_POSITIVE, f64::INFINITY)
    }
}
