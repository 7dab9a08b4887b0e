use crate::classifiers::{ClassifierError, LearnerSnapshot};
use crate::core::dataset::TrainingDataset;
use crate::core::instance::Instance;
use crate::core::instance_header::InstanceHeader;
use std::sync::Arc;

pub trait Classifier {
    /// Short learner name used in logs.
    fn name(&self) -> &'static str;

    fn set_model_context(&mut self, header: Arc<InstanceHeader>);

    /// Rebuilds the model from scratch on the whole dataset.
    fn train(&mut self, dataset: &TrainingDataset) -> Result<(), ClassifierError>;

    /// One probability per class, summing to one.
    fn predict_distribution(&self, instance: &Instance) -> Result<Vec<f64>, ClassifierError>;

    fn describe(&self) -> String;

    fn number_of_classes(&self) -> usize;

    fn snapshot(&self) -> Result<LearnerSnapshot, ClassifierError> {
        Err(ClassifierError::NotPersistable(self.name()))
    }
}

/// Turns per-class log scores into a probability distribution. An empty or
/// fully degenerate input yields the uniform distribution.
pub fn normalize_log_scores(log_scores: &[f64]) -> Vec<f64> {
    let max = log_scores
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return uniform(log_scores.len());
    }

    let exp: Vec<f64> = log_scores
        .iter()
        .map(|&v| if v.is_nan() { 0.0 } else { (v - max).exp() })
        .collect();
    normalize(exp)
}

/// Scales non-negative weights to sum to one, uniform when they sum to zero.
pub fn normalize(weights: Vec<f64>) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 && total.is_finite() {
        weights.into_iter().map(|w| w / total).collect()
    } else {
        uniform(weights.len())
    }
}

fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_scores_are_softmaxed() {
        let d = normalize_log_scores(&[0.0, 2.0_f64.ln()]);
        assert!((d[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((d[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn very_negative_scores_do_not_underflow() {
        let d = normalize_log_scores(&[-5000.0, -5001.0]);
        assert!(d[0] > d[1]);
        assert!((d.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_uniform() {
        assert_eq!(normalize_log_scores(&[f64::NEG_INFINITY; 2]), vec![0.5, 0.5]);
        assert_eq!(normalize(vec![0.0, 0.0, 0.0, 0.0]), vec![0.25; 4]);
        assert!(normalize_log_scores(&[]).is_empty());
    }
}
