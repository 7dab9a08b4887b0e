use crate::classifiers::attribute_class_observers::AttributeClassObserver;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Weighted value counts per class with additive smoothing over the
/// attribute's declared domain. Values outside the domain are counted as
/// missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NominalAttributeClassObserver {
    domain_size: usize,
    alpha: f64,
    total_weight: f64,
    missing_weight: f64,
    /// `counts[class][value]`, grown on demand up to `domain_size`.
    counts: Vec<Vec<f64>>,
}

impl NominalAttributeClassObserver {
    pub fn new(domain_size: usize, alpha: f64) -> NominalAttributeClassObserver {
        NominalAttributeClassObserver {
            domain_size,
            alpha,
            total_weight: 0.0,
            missing_weight: 0.0,
            counts: Vec::new(),
        }
    }

    /// Index of `att_val` in the declared domain, if it is one.
    fn domain_index(&self, att_val: f64) -> Option<usize> {
        let in_domain =
            att_val >= 0.0 && att_val.fract() == 0.0 && att_val < self.domain_size as f64;
        in_domain.then_some(att_val as usize)
    }

    fn cell_mut(&mut self, class_val: usize, value: usize) -> &mut f64 {
        if self.counts.len() <= class_val {
            self.counts.resize_with(class_val + 1, Vec::new);
        }
        let per_value = &mut self.counts[class_val];
        if per_value.len() <= value {
            per_value.resize(value + 1, 0.0);
        }
        &mut per_value[value]
    }

    fn smoothing_domain(&self) -> usize {
        self.domain_size.max(1)
    }

    pub fn total_weight_observed(&self) -> f64 {
        self.total_weight
    }

    pub fn missing_weight_observed(&self) -> f64 {
        self.missing_weight
    }
}

impl AttributeClassObserver for NominalAttributeClassObserver {
    fn observe_attribute_class(&mut self, att_val: f64, class_val: usize, weight: f64) {
        self.total_weight += weight;
        match self.domain_index(att_val) {
            Some(value) => *self.cell_mut(class_val, value) += weight,
            None => self.missing_weight += weight,
        }
    }

    fn log_probability_of_attribute_value_given_class(
        &self,
        att_val: f64,
        class_val: usize,
    ) -> Option<f64> {
        let value = self.domain_index(att_val)?;
        let per_value = self.counts.get(class_val).map(Vec::as_slice).unwrap_or(&[]);
        let seen = per_value.get(value).copied().unwrap_or(0.0);
        let class_total: f64 = per_value.iter().sum();

        let numerator = seen + self.alpha;
        let denominator = class_total + self.alpha * self.smoothing_domain() as f64;
        (numerator > 0.0 && denominator > 0.0).then(|| numerator.ln() - denominator.ln())
    }

    fn describe_into(&self, out: &mut String) {
        for (class_idx, per_value) in self.counts.iter().enumerate() {
            let cells: Vec<String> = per_value.iter().map(|c| format!("{c:.4}")).collect();
            let _ = writeln!(out, "    class {class_idx}: [{}]", cells.join(", "));
        }
        if self.missing_weight > 0.0 {
            let _ = writeln!(out, "    missing: {:.4}", self.missing_weight);
        }
    }
}
