use crate::classifiers::{Classifier, ClassifierError};
use crate::core::dataset::TrainingDataset;
use crate::core::instance::Instance;
use crate::core::instance_header::InstanceHeader;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct TrainCalls {
    sizes: Vec<usize>,
    last_weights: Vec<f64>,
}

/// Read side of a [`TrainSpyClassifier`], kept by the test.
#[derive(Debug, Clone)]
pub struct TrainSpyHandle(Arc<Mutex<TrainCalls>>);

impl TrainSpyHandle {
    fn calls(&self) -> MutexGuard<'_, TrainCalls> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn count(&self) -> usize {
        self.calls().sizes.len()
    }

    /// Dataset size seen by each train call, in order.
    pub fn train_sizes(&self) -> Vec<usize> {
        self.calls().sizes.clone()
    }

    /// Instance weights seen by the latest train call.
    pub fn last_weights(&self) -> Vec<f64> {
        self.calls().last_weights.clone()
    }
}

/// Records what it is trained on and predicts the uniform distribution.
#[derive(Debug)]
pub struct TrainSpyClassifier {
    calls: Arc<Mutex<TrainCalls>>,
    num_classes: usize,
}

impl TrainSpyClassifier {
    pub fn new(num_classes: usize) -> (Self, TrainSpyHandle) {
        let calls = Arc::new(Mutex::new(TrainCalls::default()));
        (
            Self {
                calls: Arc::clone(&calls),
                num_classes,
            },
            TrainSpyHandle(calls),
        )
    }
}

impl Classifier for TrainSpyClassifier {
    fn name(&self) -> &'static str {
        "train-spy"
    }

    fn set_model_context(&mut self, header: Arc<InstanceHeader>) {
        self.num_classes = header.number_of_classes();
    }

    fn train(&mut self, dataset: &TrainingDataset) -> Result<(), ClassifierError> {
        let mut calls = self
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        calls.sizes.push(dataset.len());
        calls.last_weights = dataset.iter().map(Instance::weight).collect();
        Ok(())
    }

    fn predict_distribution(&self, _instance: &Instance) -> Result<Vec<f64>, ClassifierError> {
        let n = self.num_classes.max(1);
        Ok(vec![1.0 / n as f64; n])
    }

    fn describe(&self) -> String {
        format!("train spy ({} classes)\n", self.num_classes)
    }

    fn number_of_classes(&self) -> usize {
        self.num_classes
    }
}
