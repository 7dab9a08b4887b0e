use crate::classifiers::{Classifier, ClassifierError};
use crate::core::dataset::TrainingDataset;
use crate::core::instance::Instance;
use crate::core::instance_header::InstanceHeader;
use std::sync::Arc;

/// Trains without complaint and answers every query with an empty
/// distribution.
#[derive(Debug, Default)]
pub struct ClassifierNoneVotes;

impl Classifier for ClassifierNoneVotes {
    fn name(&self) -> &'static str {
        "none-votes"
    }

    fn set_model_context(&mut self, _header: Arc<InstanceHeader>) {}

    fn train(&mut self, _dataset: &TrainingDataset) -> Result<(), ClassifierError> {
        Ok(())
    }

    fn predict_distribution(&self, _instance: &Instance) -> Result<Vec<f64>, ClassifierError> {
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        String::from("no votes\n")
    }

    fn number_of_classes(&self) -> usize {
        0
    }
}
