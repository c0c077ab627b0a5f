use crate::distribution::RateDistribution;
use crate::error::{ClockError, ClockResult};
use tracing::debug;

/// Quantiles of `dist` at the midpoints `(i + 0.5) / k`.
pub fn quantile_rates(dist: &dyn RateDistribution, k: usize) -> ClockResult<Vec<f64>> {
    if k == 0 {
        return Err(ClockError::Config(
            "rate category table needs at least one category".to_string(),
        ));
    }
    (0..k)
        .map(|i| {
            let p = (i as f64 + 0.5) / k as f64;
            let rate = dist.inverse_cdf(p)?;
            if rate > 0.0 {
                Ok(rate)
            } else {
                Err(ClockError::Numeric(format!(
                    "{} gives non-positive rate {} for category {}",
                    dist.name(),
                    rate,
                    i
                )))
            }
        })
        .collect()
}

/// Discretized rates with a shadow copy for rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCategoryTable {
    rates: Vec<f64>,
    stored: Vec<f64>,
}

impl RateCategoryTable {
    pub fn build(dist: &dyn RateDistribution, k: usize) -> ClockResult<Self> {
        let rates = quantile_rates(dist, k)?;
        Ok(Self {
            stored: rates.clone(),
            rates,
        })
    }

    /// Recompute in place. On error the current rates are untouched.
    pub fn rebuild(&mut self, dist: &dyn RateDistribution) -> ClockResult<()> {
        let fresh = quantile_rates(dist, self.rates.len())?;
        debug!("Rebuilt {} {} rate categories", fresh.len(), dist.name());
        self.rates = fresh;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn rate(&self, category: usize) -> ClockResult<f64> {
        self.rates.get(category).copied().ok_or_else(|| {
            ClockError::Parameter(format!(
                "rate category {} out of range (table has {})",
                category,
                self.rates.len()
            ))
        })
    }

    pub fn store(&mut self) {
        self.stored.copy_from_slice(&self.rates);
    }

    pub fn restore(&mut self) {
        std::mem::swap(&mut self.rates, &mut self.stored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{Exponential, LogNormal, Uniform};

    #[test]
    fn test_uniform_midpoints() {
        let d = Uniform::new(0.0, 1.0).unwrap();
        let table = RateCategoryTable::build(&d, 4).unwrap();
        let expected = [0.125, 0.375, 0.625, 0.875];
        for (got, want) in table.rates().iter().zip(expected) {
            assert!((got - want).abs() < 1e-15);
        }
    }

    #[test]
    fn test_exponential_midpoints() {
        let d = Exponential::new(1.0).unwrap();
        let table = RateCategoryTable::build(&d, 4).unwrap();
        for (i, p) in [0.125f64, 0.375, 0.625, 0.875].iter().enumerate() {
            assert!((table.rate(i).unwrap() + (1.0 - p).ln()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rates_are_increasing() {
        let d = LogNormal::with_unit_mean(1.0).unwrap();
        let table = RateCategoryTable::build(&d, 10).unwrap();
        assert!(table.rates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_categories_rejected() {
        let d = Uniform::new(0.0, 1.0).unwrap();
        assert!(RateCategoryTable::build(&d, 0).is_err());
    }

    #[test]
    fn test_restore_swaps_back() {
        let mut table = RateCategoryTable::build(&LogNormal::with_unit_mean(0.2).unwrap(), 3).unwrap();
        let before = table.rates().to_vec();
        table.store();
        table.rebuild(&LogNormal::with_unit_mean(0.8).unwrap()).unwrap();
        assert_ne!(table.rates(), before.as_slice());
        table.restore();
        assert_eq!(table.rates(), before.as_slice());
    }

    #[test]
    fn test_out_of_range_category() {
        let table = RateCategoryTable::build(&Uniform::new(0.0, 1.0).unwrap(), 2).unwrap();
        assert!(matches!(table.rate(2), Err(ClockError::Parameter(_))));
    }
}
