use crate::classifiers::{Classifier, ClassifierError};
use crate::core::dataset::TrainingDataset;
use crate::core::instance::Instance;
use crate::core::instance_header::{InstanceHeader, Schema};
use crate::protocol::ProtocolError;
use crate::session::persistence::{self, PersistenceError};
use crate::session::staging::ClassificationStaging;
use cpu_time::ThreadTime;
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;

/// Reweight cursor position that disagreed with the dataset size at train.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorMismatch {
    pub cursor: usize,
    pub dataset_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrainOutcome {
    pub cursor_mismatch: Option<CursorMismatch>,
}

/// Everything a worker keeps between commands. The schema is fixed for the
/// lifetime of the session.
pub struct Session {
    schema: Schema,
    dataset: TrainingDataset,
    classifier: Box<dyn Classifier>,
    cursor: usize,
}

impl Session {
    pub fn new(header: Arc<InstanceHeader>, classifier: Box<dyn Classifier>) -> Self {
        Self::with_dataset(header, classifier, TrainingDataset::new())
    }

    /// Starts a session seeded with `dataset`. The classifier receives the
    /// header but is not trained.
    pub fn with_dataset(
        header: Arc<InstanceHeader>,
        mut classifier: Box<dyn Classifier>,
        dataset: TrainingDataset,
    ) -> Self {
        let schema = header.schema();
        classifier.set_model_context(header);
        Self {
            schema,
            dataset,
            classifier,
            cursor: 0,
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn dataset(&self) -> &TrainingDataset {
        &self.dataset
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn append(&mut self, instances: Vec<Instance>) {
        self.dataset.extend(instances);
    }

    /// Empties the dataset. The cursor is left where it is.
    pub fn clear(&mut self) {
        self.dataset.clear();
    }

    /// Sets the weights of consecutive instances starting at the cursor and
    /// advances it. A batch running past the end is rejected as a whole.
    pub fn reweight(&mut self, weights: &[f64]) -> Result<(), ProtocolError> {
        let dataset_len = self.dataset.len();
        let end = self.cursor.checked_add(weights.len());
        if end.is_none_or(|end| end > dataset_len) {
            return Err(ProtocolError::ReweightOutOfRange {
                cursor: self.cursor,
                count: weights.len(),
                dataset_len,
            });
        }

        for (offset, &w) in weights.iter().enumerate() {
            self.dataset.set_weight(self.cursor + offset, w);
        }
        self.cursor += weights.len();
        Ok(())
    }

    /// Refits the classifier on the whole dataset. A non-zero cursor that
    /// does not cover the dataset is reported; the cursor is reset either way.
    pub fn train(&mut self) -> Result<TrainOutcome, ClassifierError> {
        let mut outcome = TrainOutcome::default();
        if self.cursor != 0 {
            if self.cursor != self.dataset.len() {
                warn!(
                    "Reweighted {} instances but dataset holds {}",
                    self.cursor,
                    self.dataset.len()
                );
                outcome.cursor_mismatch = Some(CursorMismatch {
                    cursor: self.cursor,
                    dataset_len: self.dataset.len(),
                });
            }
            self.cursor = 0;
        }

        let start = ThreadTime::now();
        self.classifier.train(&self.dataset)?;
        debug!(
            "Trained {} on {} instances in {:.3}s CPU",
            self.classifier.name(),
            self.dataset.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(outcome)
    }

    pub fn classify(&self, instance: Instance) -> Result<Vec<f64>, ClassifierError> {
        let distribution = ClassificationStaging::new(instance).query(self.classifier.as_ref())?;
        if distribution.len() != self.schema.class_count {
            return Err(ClassifierError::DistributionLength {
                expected: self.schema.class_count,
                found: distribution.len(),
            });
        }
        Ok(distribution)
    }

    pub fn describe(&self) -> String {
        self.classifier.describe()
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        info!("Saving classifier to {}", path.display());
        persistence::save_classifier(path, self.schema, self.classifier.as_ref())
    }

    /// Replaces the classifier with the one stored at `path`. On any error
    /// the current classifier stays in place.
    pub fn load(&mut self, path: &Path) -> Result<(), PersistenceError> {
        info!("Loading classifier from {}", path.display());
        self.classifier = persistence::load_classifier(path, self.schema)?;
        Ok(())
    }

    pub fn write_description(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::write_description(path, &self.describe())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("schema", &self.schema)
            .field("dataset_len", &self.dataset.len())
            .field("classifier", &self.classifier.name())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::bayes::NaiveBayes;
    use crate::core::attributes::{AttributeRef, NominalAttribute, NumericAttribute};
    use crate::testing::spies::TrainSpyClassifier;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tempfile::tempdir;

    fn header() -> Arc<InstanceHeader> {
        Arc::new(InstanceHeader::new(
            "two".into(),
            vec![
                Arc::new(NumericAttribute::new("x".into())) as AttributeRef,
                Arc::new(NominalAttribute::with_values(
                    "class".into(),
                    vec!["neg".into(), "pos".into()],
                )) as AttributeRef,
            ],
            1,
        ))
    }

    fn rows(n: usize) -> Vec<Instance> {
        (0..n)
            .map(|i| Instance::new(vec![i as f64, (i % 2) as f64], 1.0))
            .collect()
    }

    fn nb_session() -> Session {
        Session::new(header(), Box::new(NaiveBayes::new()))
    }

    #[test]
    fn append_then_clear_empties_dataset_and_keeps_schema() {
        let mut s = nb_session();
        let schema = s.schema();
        s.append(rows(3));
        s.append(rows(2));
        assert_eq!(s.dataset().len(), 5);
        s.clear();
        assert_eq!(s.dataset().len(), 0);
        assert_eq!(s.schema(), schema);
    }

    #[test]
    fn split_reweight_equals_single_reweight() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let size = rng.random_range(1..30);
            let n1 = rng.random_range(0..=size);
            let weights: Vec<f64> = (0..size).map(|_| rng.random_range(0.0..5.0)).collect();

            let mut split = nb_session();
            split.append(rows(size));
            split.reweight(&weights[..n1]).unwrap();
            split.reweight(&weights[n1..]).unwrap();

            let mut whole = nb_session();
            whole.append(rows(size));
            whole.reweight(&weights).unwrap();

            assert_eq!(split.cursor(), whole.cursor());
            let a: Vec<f64> = split.dataset().iter().map(Instance::weight).collect();
            let b: Vec<f64> = whole.dataset().iter().map(Instance::weight).collect();
            assert_eq!(a, b);
            assert_eq!(a, weights);
        }
    }

    #[test]
    fn reweight_past_end_changes_nothing() {
        let mut s = nb_session();
        s.append(rows(3));
        s.reweight(&[2.0, 2.0]).unwrap();
        let err = s.reweight(&[5.0, 5.0]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ReweightOutOfRange {
                cursor: 2,
                count: 2,
                dataset_len: 3
            }
        );
        assert_eq!(s.cursor(), 2);
        assert_eq!(s.dataset().get(2).unwrap().weight(), 1.0);
    }

    #[test]
    fn train_with_full_cursor_resets_silently() {
        let (spy, calls) = TrainSpyClassifier::new(2);
        let mut s = Session::new(header(), Box::new(spy));
        s.append(rows(2));
        s.reweight(&[1.0, 3.0]).unwrap();

        let outcome = s.train().unwrap();
        assert_eq!(outcome.cursor_mismatch, None);
        assert_eq!(s.cursor(), 0);
        assert_eq!(calls.train_sizes(), vec![2]);
        assert_eq!(calls.last_weights(), vec![1.0, 3.0]);
    }

    #[test]
    fn train_with_partial_cursor_warns_resets_and_trains() {
        let (spy, calls) = TrainSpyClassifier::new(2);
        let mut s = Session::new(header(), Box::new(spy));
        s.append(rows(3));
        s.reweight(&[4.0]).unwrap();

        let outcome = s.train().unwrap();
        assert_eq!(
            outcome.cursor_mismatch,
            Some(CursorMismatch {
                cursor: 1,
                dataset_len: 3
            })
        );
        assert_eq!(s.cursor(), 0);
        assert_eq!(calls.train_sizes(), vec![3]);
    }

    #[test]
    fn train_with_zero_cursor_reports_nothing() {
        let mut s = nb_session();
        s.append(rows(4));
        assert_eq!(s.train().unwrap(), TrainOutcome::default());
    }

    #[test]
    fn classify_does_not_touch_dataset() {
        let mut s = nb_session();
        s.append(rows(4));
        s.train().unwrap();
        let d = s.classify(Instance::new(vec![1.0, f64::NAN], 1.0)).unwrap();
        assert_eq!(d.len(), 2);
        assert!((d.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(s.dataset().len(), 4);
    }

    #[test]
    fn save_then_load_keeps_description() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.json");
        let mut s = nb_session();
        s.append(rows(6));
        s.train().unwrap();
        let before = s.describe();
        s.save(&path).unwrap();

        s.append(vec![Instance::new(vec![100.0, 1.0], 9.0)]);
        s.train().unwrap();
        assert_ne!(s.describe(), before);

        s.load(&path).unwrap();
        assert_eq!(s.describe(), before);
    }

    #[test]
    fn failed_load_keeps_current_classifier() {
        let dir = tempdir().unwrap();
        let mut s = nb_session();
        s.append(rows(4));
        s.train().unwrap();
        let before = s.describe();
        assert!(s.load(&dir.path().join("missing.json")).is_err());
        assert_eq!(s.describe(), before);
    }

    #[test]
    fn write_description_matches_describe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.txt");
        let s = nb_session();
        s.write_description(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), s.describe());
    }
}
