use crate::classifiers::{Classifier, ClassifierError};
use crate::core::instance::Instance;

/// Holds the single instance of a classify request. Consumed by the query,
/// so a staged instance can never end up in the training data.
#[derive(Debug)]
pub struct ClassificationStaging {
    instance: Instance,
}

impl ClassificationStaging {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }

    pub fn query(self, classifier: &dyn Classifier) -> Result<Vec<f64>, ClassifierError> {
        classifier.predict_distribution(&self.instance)
    }
}
