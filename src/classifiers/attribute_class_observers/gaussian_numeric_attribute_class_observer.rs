use crate::classifiers::attribute_class_observers::AttributeClassObserver;
use crate::core::estimators::GaussianEstimator;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One Gaussian per class plus a pooled one, used for classes that never
/// saw a value of this attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNumericAttributeClassObserver {
    min_std_dev: f64,
    per_class: Vec<GaussianEstimator>,
    pooled: GaussianEstimator,
}

impl GaussianNumericAttributeClassObserver {
    pub fn new(min_std_dev: f64) -> Self {
        GaussianNumericAttributeClassObserver {
            min_std_dev,
            per_class: Vec::new(),
            pooled: GaussianEstimator::new(),
        }
    }

    fn estimator_mut(&mut self, class_val: usize) -> &mut GaussianEstimator {
        if self.per_class.len() <= class_val {
            self.per_class.resize_with(class_val + 1, GaussianEstimator::new);
        }
        &mut self.per_class[class_val]
    }

    pub fn estimator_for_class(&self, class_val: usize) -> Option<&GaussianEstimator> {
        self.per_class
            .get(class_val)
            .filter(|est| est.weight() > 0.0)
    }
}

impl AttributeClassObserver for GaussianNumericAttributeClassObserver {
    fn observe_attribute_class(&mut self, att_val: f64, class_val: usize, weight: f64) {
        if !att_val.is_finite() || !weight.is_finite() || weight <= 0.0 {
            return;
        }

        self.estimator_mut(class_val).add_observation(att_val, weight);
        self.pooled.add_observation(att_val, weight);
    }

    fn log_probability_of_attribute_value_given_class(
        &self,
        att_val: f64,
        class_val: usize,
    ) -> Option<f64> {
        if !att_val.is_finite() {
            return None;
        }
        match self.estimator_for_class(class_val) {
            Some(est) => Some(est.log_density(att_val, self.min_std_dev)),
            None if self.pooled.weight() > 0.0 => {
                Some(self.pooled.log_density(att_val, self.min_std_dev))
            }
            None => None,
        }
    }

    fn describe_into(&self, out: &mut String) {
        for (class_idx, est) in self.per_class.iter().enumerate() {
            let _ = writeln!(
                out,
                "    class {class_idx}: mean={:.4} std_dev={:.4} weight={:.4}",
                est.mean(),
                est.std_dev().max(self.min_std_dev),
                est.weight()
            );
        }
    }
}
