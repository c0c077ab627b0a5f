use crate::error::{ClockError, ClockResult};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A continuous, positive rate distribution that can be discretized.
pub trait RateDistribution: Debug {
    fn name(&self) -> &str;

    /// Quantile function. `p` must lie strictly inside `(0, 1)`.
    fn inverse_cdf(&self, p: f64) -> ClockResult<f64>;

    /// Real-space mean, when finite.
    fn mean(&self) -> Option<f64>;
}

/// Log-normal parameterized by its real-space mean and log-space sigma.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormal {
    mean: f64,
    sigma: f64,
}

impl LogNormal {
    pub fn new(mean: f64, sigma: f64) -> ClockResult<Self> {
        if !(mean > 0.0 && mean.is_finite()) {
            return Err(ClockError::Numeric(format!(
                "log-normal mean must be positive and finite, got {}",
                mean
            )));
        }
        if !(sigma >= 0.0 && sigma.is_finite()) {
            return Err(ClockError::Numeric(format!(
                "log-normal sigma must be non-negative and finite, got {}",
                sigma
            )));
        }
        Ok(Self { mean, sigma })
    }

    pub fn with_unit_mean(sigma: f64) -> ClockResult<Self> {
        Self::new(1.0, sigma)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Log-space location giving the configured real-space mean.
    pub fn mu(&self) -> f64 {
        self.mean.ln() - 0.5 * self.sigma * self.sigma
    }
}

impl RateDistribution for LogNormal {
    fn name(&self) -> &str {
        "log_normal"
    }

    fn inverse_cdf(&self, p: f64) -> ClockResult<f64> {
        let z = normal_quantile(p)?;
        finite(self.name(), p, (self.mu() + self.sigma * z).exp())
    }

    fn mean(&self) -> Option<f64> {
        Some(self.mean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    mean: f64,
}

impl Exponential {
    pub fn new(mean: f64) -> ClockResult<Self> {
        if !(mean > 0.0 && mean.is_finite()) {
            return Err(ClockError::Numeric(format!(
                "exponential mean must be positive and finite, got {}",
                mean
            )));
        }
        Ok(Self { mean })
    }
}

impl RateDistribution for Exponential {
    fn name(&self) -> &str {
        "exponential"
    }

    fn inverse_cdf(&self, p: f64) -> ClockResult<f64> {
        check_probability(p)?;
        finite(self.name(), p, -self.mean * (-p).ln_1p())
    }

    fn mean(&self) -> Option<f64> {
        Some(self.mean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    lower: f64,
    upper: f64,
}

impl Uniform {
    pub fn new(lower: f64, upper: f64) -> ClockResult<Self> {
        if !(lower >= 0.0 && lower < upper && upper.is_finite()) {
            return Err(ClockError::Numeric(format!(
                "uniform rate bounds must satisfy 0 <= lower < upper < inf, got [{}, {}]",
                lower, upper
            )));
        }
        Ok(Self { lower, upper })
    }
}

impl RateDistribution for Uniform {
    fn name(&self) -> &str {
        "uniform"
    }

    fn inverse_cdf(&self, p: f64) -> ClockResult<f64> {
        check_probability(p)?;
        Ok(self.lower + p * (self.upper - self.lower))
    }

    fn mean(&self) -> Option<f64> {
        Some(0.5 * (self.lower + self.upper))
    }
}

/// Distribution section of a model definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionSpec {
    LogNormal {
        #[serde(default = "unit")]
        mean: f64,
        sigma: f64,
    },
    Exponential {
        #[serde(default = "unit")]
        mean: f64,
    },
    Uniform {
        lower: f64,
        upper: f64,
    },
}

fn unit() -> f64 {
    1.0
}

impl DistributionSpec {
    pub fn build(&self) -> ClockResult<Box<dyn RateDistribution>> {
        Ok(match *self {
            DistributionSpec::LogNormal { mean, sigma } => Box::new(LogNormal::new(mean, sigma)?),
            DistributionSpec::Exponential { mean } => Box::new(Exponential::new(mean)?),
            DistributionSpec::Uniform { lower, upper } => Box::new(Uniform::new(lower, upper)?),
        })
    }
}

fn check_probability(p: f64) -> ClockResult<()> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(ClockError::Numeric(format!(
            "quantile requested at p = {}, outside (0, 1)",
            p
        )))
    }
}

fn finite(name: &str, p: f64, x: f64) -> ClockResult<f64> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(ClockError::Numeric(format!(
            "{} quantile at p = {} is not finite",
            name, p
        )))
    }
}

// Acklam's rational approximation, relative error below 1.2e-9.
const A: [f64; 6] = [
    -3.969683028665376e+01,
    2.209460984245205e+02,
    -2.759285104469687e+02,
    1.383577518672690e+02,
    -3.066479806614716e+01,
    2.506628277459239e+00,
];
const B: [f64; 5] = [
    -5.447609879822406e+01,
    1.615858368580409e+02,
    -1.556989798598866e+02,
    6.680131188771972e+01,
    -1.328068155288572e+01,
];
const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
    4.374664141464968e+00,
    2.938163982698783e+00,
];
const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];
const P_LOW: f64 = 0.02425;

/// Standard normal quantile.
pub fn normal_quantile(p: f64) -> ClockResult<f64> {
    check_probability(p)?;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let z = if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (-p).ln_1p()).sqrt())
    };
    Ok(z)
}
