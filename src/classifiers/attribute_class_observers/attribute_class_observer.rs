use super::{GaussianNumericAttributeClassObserver, NominalAttributeClassObserver};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub trait AttributeClassObserver {
    fn observe_attribute_class(&mut self, att_val: f64, class_val: usize, weight: f64);

    /// `None` when the observer has nothing to say about this value/class pair,
    /// in which case the attribute is left out of the product.
    fn log_probability_of_attribute_value_given_class(
        &self,
        att_val: f64,
        class_val: usize,
    ) -> Option<f64>;

    fn describe_into(&self, out: &mut String);
}

/// Owned observer slot. An enum rather than a boxed trait object so the
/// learner state can go through serde as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AttributeObserver {
    Nominal(NominalAttributeClassObserver),
    Gaussian(GaussianNumericAttributeClassObserver),
}

impl AttributeObserver {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttributeObserver::Nominal(_) => "nominal",
            AttributeObserver::Gaussian(_) => "numeric",
        }
    }

    fn inner(&self) -> &dyn AttributeClassObserver {
        match self {
            AttributeObserver::Nominal(o) => o,
            AttributeObserver::Gaussian(o) => o,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AttributeClassObserver {
        match self {
            AttributeObserver::Nominal(o) => o,
            AttributeObserver::Gaussian(o) => o,
        }
    }
}

impl AttributeClassObserver for AttributeObserver {
    fn observe_attribute_class(&mut self, att_val: f64, class_val: usize, weight: f64) {
        self.inner_mut()
            .observe_attribute_class(att_val, class_val, weight);
    }

    fn log_probability_of_attribute_value_given_class(
        &self,
        att_val: f64,
        class_val: usize,
    ) -> Option<f64> {
        self.inner()
            .log_probability_of_attribute_value_given_class(att_val, class_val)
    }

    fn describe_into(&self, out: &mut String) {
        let _ = writeln!(out, "  ({})", self.kind_name());
        self.inner().describe_into(out);
    }
}
