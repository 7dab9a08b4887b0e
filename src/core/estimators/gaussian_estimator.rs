use serde::{Deserialize, Serialize};

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Weighted running mean and variance, updated one observation at a time.
/// Non-finite values are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GaussianEstimator {
    weight: f64,
    mean: f64,
    /// Weighted sum of squared deviations from the running mean.
    m2: f64,
}

impl GaussianEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observation(&mut self, value: f64, weight: f64) {
        if !value.is_finite() {
            return;
        }
        if self.weight <= 0.0 {
            *self = Self {
                weight,
                mean: value,
                m2: 0.0,
            };
            return;
        }

        self.weight += weight;
        let delta = value - self.mean;
        self.mean += weight * delta / self.weight;
        self.m2 += weight * delta * (value - self.mean);
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance; zero until more than one unit of weight is seen.
    pub fn variance(&self) -> f64 {
        if self.weight > 1.0 {
            self.m2 / (self.weight - 1.0)
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Log density of `value` under N(mean, max(std_dev, min_std_dev)).
    pub fn log_density(&self, value: f64, min_std_dev: f64) -> f64 {
        let sigma = self.std_dev().max(min_std_dev);
        let z = (value - self.mean) / sigma;
        -LN_SQRT_2PI - sigma.ln() - 0.5 * z * z
    }
}
