use crate::classifiers::Classifier;
use crate::classifiers::bayes::NaiveBayes;
use crate::classifiers::rules::MajorityClass;
use serde::{Deserialize, Serialize};

/// Complete learner state, tagged by learner kind. This is what gets
/// written to and read back from model files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "state", rename_all = "kebab-case")]
pub enum LearnerSnapshot {
    NaiveBayes(NaiveBayes),
    MajorityClass(MajorityClass),
}

impl LearnerSnapshot {
    pub fn number_of_classes(&self) -> usize {
        match self {
            LearnerSnapshot::NaiveBayes(nb) => nb.number_of_classes(),
            LearnerSnapshot::MajorityClass(mc) => mc.number_of_classes(),
        }
    }

    pub fn number_of_attributes(&self) -> usize {
        match self {
            LearnerSnapshot::NaiveBayes(nb) => nb.number_of_attributes(),
            LearnerSnapshot::MajorityClass(mc) => mc.number_of_attributes(),
        }
    }

    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            LearnerSnapshot::NaiveBayes(nb) => Box::new(nb),
            LearnerSnapshot::MajorityClass(mc) => Box::new(mc),
        }
    }
}
