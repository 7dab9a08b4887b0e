use crate::classifiers::classifier::{Classifier, normalize};
use crate::classifiers::{ClassifierError, LearnerSnapshot};
use crate::core::dataset::TrainingDataset;
use crate::core::instance::Instance;
use crate::core::instance_header::InstanceHeader;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MajorityClassParams {}

/// Predicts the weighted class frequencies seen in training, ignoring the
/// features entirely. Useful as a baseline and as a cheap placeholder model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MajorityClass {
    class_index: usize,
    number_of_attributes: usize,
    observed_class_distribution: Vec<f64>,
}

impl MajorityClass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_attributes(&self) -> usize {
        self.number_of_attributes
    }

    pub fn majority_class(&self) -> Option<usize> {
        self.observed_class_distribution
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (i, &w)| match best {
                Some((_, bw)) if bw >= w => best,
                _ => Some((i, w)),
            })
            .map(|(i, _)| i)
    }
}

impl Classifier for MajorityClass {
    fn name(&self) -> &'static str {
        "majority-class"
    }

    fn set_model_context(&mut self, header: Arc<InstanceHeader>) {
        self.class_index = header.class_index();
        self.number_of_attributes = header.number_of_attributes();
        self.observed_class_distribution = vec![0.0; header.number_of_classes()];
    }

    fn train(&mut self, dataset: &TrainingDataset) -> Result<(), ClassifierError> {
        let class_count = self.observed_class_distribution.len();
        if class_count == 0 {
            return Err(ClassifierError::ContextNotSet);
        }

        let mut counts = vec![0.0; class_count];
        for (position, instance) in dataset.iter().enumerate() {
            let Some(c) = instance.class_value(self.class_index) else {
                continue;
            };
            if c < 0.0 || c.fract() != 0.0 || c as usize >= class_count {
                return Err(ClassifierError::InvalidClassValue {
                    position,
                    value: c,
                    class_count,
                });
            }
            counts[c as usize] += instance.weight().max(0.0);
        }
        self.observed_class_distribution = counts;
        Ok(())
    }

    fn predict_distribution(&self, _instance: &Instance) -> Result<Vec<f64>, ClassifierError> {
        if self.observed_class_distribution.is_empty() {
            return Err(ClassifierError::ContextNotSet);
        }
        Ok(normalize(self.observed_class_distribution.clone()))
    }

    fn describe(&self) -> String {
        let mut out = String::from("Majority class\n");
        match self.majority_class() {
            Some(c) => {
                let _ = writeln!(out, "predicts class {c}");
            }
            None => out.push_str("no training data\n"),
        }
        let weights: Vec<String> = self
            .observed_class_distribution
            .iter()
            .map(|w| format!("{w:.4}"))
            .collect();
        let _ = writeln!(out, "class weights: [{}]", weights.join(", "));
        out
    }

    fn number_of_classes(&self) -> usize {
        self.observed_class_distribution.len()
    }

    fn snapshot(&self) -> Result<LearnerSnapshot, ClassifierError> {
        Ok(LearnerSnapshot::MajorityClass(self.clone()))
    }
}
