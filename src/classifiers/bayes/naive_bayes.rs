use crate::classifiers::attribute_class_observers::{
    AttributeClassObserver, AttributeObserver, GaussianNumericAttributeClassObserver,
    NominalAttributeClassObserver,
};
use crate::classifiers::classifier::{Classifier, normalize_log_scores};
use crate::classifiers::{ClassifierError, LearnerSnapshot};
use crate::core::dataset::TrainingDataset;
use crate::core::instance::Instance;
use crate::core::instance_header::InstanceHeader;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;

fn default_alpha() -> f64 {
    0.5
}

fn default_min_std_dev() -> f64 {
    1.0 / 6.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesParams {
    /// Additive smoothing for class priors and nominal value counts.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Floor for per-class standard deviations of numeric attributes.
    #[serde(default = "default_min_std_dev")]
    pub min_std_dev: f64,
}

impl Default for NaiveBayesParams {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            min_std_dev: default_min_std_dev(),
        }
    }
}

/// Gaussian/multinomial naive Bayes, refit from the whole dataset on every
/// `train`. Scores are combined in log space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayes {
    params: NaiveBayesParams,
    class_index: usize,
    number_of_attributes: usize,
    class_count: usize,
    attribute_names: Vec<String>,
    /// Domain size per model attribute, `None` for numeric ones.
    attribute_domains: Vec<Option<usize>>,
    observed_class_distribution: Vec<f64>,
    attribute_observers: Vec<AttributeObserver>,
}

impl NaiveBayes {
    pub fn new() -> Self {
        Self::with_params(NaiveBayesParams::default())
    }

    pub fn with_params(params: NaiveBayesParams) -> Self {
        Self {
            params,
            class_index: 0,
            number_of_attributes: 0,
            class_count: 0,
            attribute_names: Vec::new(),
            attribute_domains: Vec::new(),
            observed_class_distribution: Vec::new(),
            attribute_observers: Vec::new(),
        }
    }

    pub fn number_of_attributes(&self) -> usize {
        self.number_of_attributes
    }

    pub fn observed_class_distribution(&self) -> &[f64] {
        &self.observed_class_distribution
    }

    #[inline]
    fn model_att_index_to_instance_att_index(model_idx: usize, class_idx: usize) -> usize {
        if class_idx > model_idx {
            model_idx
        } else {
            model_idx + 1
        }
    }

    fn fresh_observers(&self) -> Vec<AttributeObserver> {
        self.attribute_domains
            .iter()
            .map(|domain| match domain {
                Some(size) => AttributeObserver::Nominal(NominalAttributeClassObserver::new(
                    *size,
                    self.params.alpha,
                )),
                None => AttributeObserver::Gaussian(GaussianNumericAttributeClassObserver::new(
                    self.params.min_std_dev,
                )),
            })
            .collect()
    }

    fn reset(&mut self) -> Result<(), ClassifierError> {
        if self.class_count == 0 {
            return Err(ClassifierError::ContextNotSet);
        }
        self.observed_class_distribution = vec![0.0; self.class_count];
        self.attribute_observers = self.fresh_observers();
        Ok(())
    }

    fn check_arity(&self, instance: &Instance) -> Result<(), ClassifierError> {
        if instance.number_of_attributes() != self.number_of_attributes {
            return Err(ClassifierError::ArityMismatch {
                expected: self.number_of_attributes,
                found: instance.number_of_attributes(),
            });
        }
        Ok(())
    }

    /// Nominal features must be a valid index into their declared domain.
    fn check_nominal_values(
        &self,
        position: usize,
        instance: &Instance,
    ) -> Result<(), ClassifierError> {
        for (m, domain) in self.attribute_domains.iter().enumerate() {
            let Some(domain) = *domain else {
                continue;
            };
            let inst_idx = Self::model_att_index_to_instance_att_index(m, self.class_index);
            let Some(value) = instance.value_at_index(inst_idx) else {
                continue;
            };
            if value.is_nan() {
                continue;
            }
            if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= domain as f64
            {
                return Err(ClassifierError::InvalidNominalValue {
                    position,
                    attribute: self.attribute_names.get(m).cloned().unwrap_or_default(),
                    value,
                    domain,
                });
            }
        }
        Ok(())
    }

    fn train_on_instance(
        &mut self,
        position: usize,
        instance: &Instance,
    ) -> Result<(), ClassifierError> {
        self.check_arity(instance)?;

        let w = instance.weight().max(0.0);
        if w == 0.0 {
            return Ok(());
        }

        let Some(class_val) = instance.class_value(self.class_index) else {
            return Ok(());
        };
        if class_val < 0.0 || class_val.fract() != 0.0 || class_val as usize >= self.class_count
        {
            return Err(ClassifierError::InvalidClassValue {
                position,
                value: class_val,
                class_count: self.class_count,
            });
        }
        let class_val = class_val as usize;
        self.check_nominal_values(position, instance)?;

        self.observed_class_distribution[class_val] += w;

        for (m, obs) in self.attribute_observers.iter_mut().enumerate() {
            let inst_idx = Self::model_att_index_to_instance_att_index(m, self.class_index);
            if let Some(x) = instance.value_at_index(inst_idx) {
                obs.observe_attribute_class(x, class_val, w);
            }
        }
        Ok(())
    }

    pub fn do_naive_bayes_prediction(
        instance: &Instance,
        class_index: usize,
        alpha: f64,
        observed_class_distribution: &[f64],
        attribute_observers: &[AttributeObserver],
    ) -> Vec<f64> {
        let num_classes = observed_class_distribution.len();
        let observed_class_sum: f64 = observed_class_distribution.iter().sum();
        let prior_denominator = observed_class_sum + alpha * num_classes as f64;

        let mut log_scores = vec![0.0; num_classes];
        for (class_index_value, score) in log_scores.iter_mut().enumerate() {
            if prior_denominator > 0.0 {
                let prior = observed_class_distribution[class_index_value] + alpha;
                *score = if prior > 0.0 {
                    prior.ln() - prior_denominator.ln()
                } else {
                    f64::NEG_INFINITY
                };
            }

            for (att_index, obs) in attribute_observers.iter().enumerate() {
                let inst_att_index =
                    Self::model_att_index_to_instance_att_index(att_index, class_index);

                if instance.is_missing_at_index(inst_att_index) {
                    continue;
                }
                let Some(x) = instance.value_at_index(inst_att_index) else {
                    continue;
                };
                if let Some(lp) =
                    obs.log_probability_of_attribute_value_given_class(x, class_index_value)
                {
                    *score += lp;
                }
            }
        }

        normalize_log_scores(&log_scores)
    }
}

impl Default for NaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for NaiveBayes {
    fn name(&self) -> &'static str {
        "naive-bayes"
    }

    fn set_model_context(&mut self, header: Arc<InstanceHeader>) {
        self.class_index = header.class_index();
        self.number_of_attributes = header.number_of_attributes();
        self.class_count = header.number_of_classes();

        let model_attributes = (0..self.number_of_attributes.saturating_sub(1))
            .map(|m| Self::model_att_index_to_instance_att_index(m, self.class_index))
            .map(|idx| (idx, header.attribute_at_index(idx)));
        let (names, domains): (Vec<String>, Vec<Option<usize>>) = model_attributes
            .map(|(idx, attr)| match attr {
                Some(a) => (a.name(), a.domain_size()),
                None => (format!("att{idx}"), None),
            })
            .unzip();
        self.attribute_names = names;
        self.attribute_domains = domains;

        self.observed_class_distribution = vec![0.0; self.class_count];
        self.attribute_observers = self.fresh_observers();
    }

    fn train(&mut self, dataset: &TrainingDataset) -> Result<(), ClassifierError> {
        self.reset()?;
        for (position, instance) in dataset.iter().enumerate() {
            self.train_on_instance(position, instance)?;
        }
        Ok(())
    }

    fn predict_distribution(&self, instance: &Instance) -> Result<Vec<f64>, ClassifierError> {
        if self.class_count == 0 {
            return Err(ClassifierError::ContextNotSet);
        }
        self.check_arity(instance)?;
        Ok(NaiveBayes::do_naive_bayes_prediction(
            instance,
            self.class_index,
            self.params.alpha,
            &self.observed_class_distribution,
            &self.attribute_observers,
        ))
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Naive Bayes (alpha={}, min_std_dev={:.4})",
            self.params.alpha, self.params.min_std_dev
        );
        let priors: Vec<String> = self
            .observed_class_distribution
            .iter()
            .map(|w| format!("{w:.4}"))
            .collect();
        let _ = writeln!(out, "class weights: [{}]", priors.join(", "));
        for (name, obs) in self.attribute_names.iter().zip(&self.attribute_observers) {
            let _ = writeln!(out, "attribute {name}");
            obs.describe_into(&mut out);
        }
        out
    }

    fn number_of_classes(&self) -> usize {
        self.class_count
    }

    fn snapshot(&self) -> Result<LearnerSnapshot, ClassifierError> {
        Ok(LearnerSnapshot::NaiveBayes(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::{AttributeRef, NominalAttribute, NumericAttribute};

    fn nominal_attr_ref(name: &str, values: &[&str]) -> AttributeRef {
        let vals: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        Arc::new(NominalAttribute::with_values(name.to_string(), vals)) as AttributeRef
    }
    fn numeric_attr_ref(name: &str) -> AttributeRef {
        Arc::new(NumericAttribute::new(name.to_string())) as AttributeRef
    }
    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }
    const EPS: f64 = 1e-9;

    fn numeric_header() -> Arc<InstanceHeader> {
        Arc::new(InstanceHeader::new(
            "rel".into(),
            vec![numeric_attr_ref("X"), nominal_attr_ref("C", &["c0", "c1"])],
            1,
        ))
    }

    fn dataset(rows: &[(f64, f64)]) -> TrainingDataset {
        TrainingDataset::from_instances(
            rows.iter()
                .map(|&(x, c)| Instance::new(vec![x, c], 1.0))
                .collect(),
        )
    }

    #[test]
    fn untrained_model_predicts_uniform() {
        let mut nb = NaiveBayes::new();
        nb.set_model_context(numeric_header());
        let d = nb
            .predict_distribution(&Instance::new(vec![1.0, f64::NAN], 1.0))
            .unwrap();
        assert_eq!(d, vec![0.5, 0.5]);
    }

    #[test]
    fn predict_without_context_is_an_error() {
        let nb = NaiveBayes::new();
        let err = nb
            .predict_distribution(&Instance::new(vec![1.0, 0.0], 1.0))
            .unwrap_err();
        assert_eq!(err, ClassifierError::ContextNotSet);
    }

    #[test]
    fn train_without_context_is_an_error() {
        let mut nb = NaiveBayes::new();
        let err = nb.train(&dataset(&[(0.0, 0.0)])).unwrap_err();
        assert_eq!(err, ClassifierError::ContextNotSet);
    }

    #[test]
    fn train_numeric_gaussian_observer_affects_votes() {
        let mut nb = NaiveBayes::new();
        nb.set_model_context(numeric_header());
        nb.train(&dataset(&[
            (-0.5, 0.0),
            (0.0, 0.0),
            (0.1, 0.0),
            (0.2, 0.0),
            (-0.2, 0.0),
            (4.8, 1.0),
            (5.0, 1.0),
            (5.2, 1.0),
            (6.0, 1.0),
            (4.0, 1.0),
        ]))
        .unwrap();

        assert!(approx(nb.observed_class_distribution()[0], 5.0, EPS));
        assert!(approx(nb.observed_class_distribution()[1], 5.0, EPS));

        let v0 = nb
            .predict_distribution(&Instance::new(vec![0.15, f64::NAN], 1.0))
            .unwrap();
        assert!(v0[0] > v0[1], "waiting C0 > C1; votes={:?}", v0);

        let v1 = nb
            .predict_distribution(&Instance::new(vec![5.1, f64::NAN], 1.0))
            .unwrap();
        assert!(v1[1] > v1[0], "waiting C1 > C0; votes={:?}", v1);
        assert!(approx(v1.iter().sum::<f64>(), 1.0, EPS));
    }

    #[test]
    fn train_updates_priors_and_nominal_observer() {
        let header = Arc::new(InstanceHeader::new(
            "rel".into(),
            vec![
                nominal_attr_ref("A0", &["0", "1"]),
                nominal_attr_ref("C", &["c0", "c1"]),
            ],
            1,
        ));
        let mut nb = NaiveBayes::with_params(NaiveBayesParams {
            alpha: 1.0,
            ..NaiveBayesParams::default()
        });
        nb.set_model_context(header);
        nb.train(&dataset(&[
            (1.0, 0.0),
            (1.0, 0.0),
            (0.0, 0.0),
            (0.0, 1.0),
            (0.0, 1.0),
            (1.0, 1.0),
        ]))
        .unwrap();

        // P(c0) = P(c1) = 4/8, P(A0=1|c0) = 3/5, P(A0=1|c1) = 2/5
        let d = nb
            .predict_distribution(&Instance::new(vec![1.0, f64::NAN], 1.0))
            .unwrap();
        assert!(approx(d[0], 0.6, 1e-9), "votes={:?}", d);
        assert!(approx(d[1], 0.4, 1e-9), "votes={:?}", d);
    }

    #[test]
    fn nominal_feature_outside_domain_is_rejected() {
        let header = Arc::new(InstanceHeader::new(
            "rel".into(),
            vec![
                nominal_attr_ref("F", &["a", "b"]),
                nominal_attr_ref("C", &["neg", "pos"]),
            ],
            1,
        ));
        for bad in [f64::INFINITY, f64::NEG_INFINITY, 1e15, 2.0, -1.0, 0.5] {
            let mut nb = NaiveBayes::new();
            nb.set_model_context(Arc::clone(&header));
            let err = nb
                .train(&dataset(&[(0.0, 0.0), (bad, 1.0)]))
                .unwrap_err();
            assert!(
                matches!(
                    &err,
                    ClassifierError::InvalidNominalValue { position: 1, domain: 2, attribute, .. }
                        if attribute == "F"
                ),
                "{bad}: {err:?}"
            );
        }

        let mut nb = NaiveBayes::new();
        nb.set_model_context(header);
        nb.train(&dataset(&[(f64::NAN, 0.0), (1.0, 1.0)])).unwrap();
    }

    #[test]
    fn retraining_starts_from_scratch() {
        let mut nb = NaiveBayes::new();
        nb.set_model_context(numeric_header());
        nb.train(&dataset(&[(0.0, 0.0), (1.0, 0.0)])).unwrap();
        nb.train(&dataset(&[(5.0, 1.0)])).unwrap();
        assert_eq!(nb.observed_class_distribution(), &[0.0, 1.0]);
    }

    #[test]
    fn weights_scale_priors_and_zero_weight_is_skipped() {
        let mut nb = NaiveBayes::new();
        nb.set_model_context(numeric_header());
        let ds = TrainingDataset::from_instances(vec![
            Instance::new(vec![0.0, 0.0], 3.0),
            Instance::new(vec![1.0, 1.0], 0.0),
            Instance::new(vec![2.0, f64::NAN], 1.0),
        ]);
        nb.train(&ds).unwrap();
        assert_eq!(nb.observed_class_distribution(), &[3.0, 0.0]);
    }

    #[test]
    fn class_value_outside_domain_is_rejected() {
        let mut nb = NaiveBayes::new();
        nb.set_model_context(numeric_header());
        let err = nb.train(&dataset(&[(0.0, 0.0), (1.0, 2.0)])).unwrap_err();
        assert_eq!(
            err,
            ClassifierError::InvalidClassValue {
                position: 1,
                value: 2.0,
                class_count: 2
            }
        );
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let mut nb = NaiveBayes::new();
        nb.set_model_context(numeric_header());
        let err = nb
            .predict_distribution(&Instance::new(vec![1.0], 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            ClassifierError::ArityMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn class_in_first_slot_maps_attributes_correctly() {
        let header = Arc::new(InstanceHeader::new(
            "rel".into(),
            vec![nominal_attr_ref("C", &["c0", "c1"]), numeric_attr_ref("X")],
            0,
        ));
        let mut nb = NaiveBayes::new();
        nb.set_model_context(header);
        let ds = TrainingDataset::from_instances(vec![
            Instance::new(vec![0.0, 0.0], 1.0),
            Instance::new(vec![0.0, 0.2], 1.0),
            Instance::new(vec![1.0, 9.0], 1.0),
            Instance::new(vec![1.0, 9.5], 1.0),
        ]);
        nb.train(&ds).unwrap();
        let d = nb
            .predict_distribution(&Instance::new(vec![f64::NAN, 9.2], 1.0))
            .unwrap();
        assert!(d[1] > 0.99, "votes={:?}", d);
    }

    #[test]
    fn describe_lists_attributes() {
        let mut nb = NaiveBayes::new();
        nb.set_model_context(numeric_header());
        nb.train(&dataset(&[(1.0, 0.0), (3.0, 0.0)])).unwrap();
        let text = nb.describe();
        assert!(text.starts_with("Naive Bayes"));
        assert!(text.contains("attribute X"));
        assert!(text.contains("class 0: mean=2.0000"));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut nb = NaiveBayes::new();
        nb.set_model_context(numeric_header());
        nb.train(&dataset(&[(0.1, 0.0), (0.3, 0.0), (4.0, 1.0)]))
            .unwrap();

        let json = serde_json::to_string(&nb.snapshot().unwrap()).unwrap();
        let restored: LearnerSnapshot = serde_json::from_str(&json).unwrap();
        let restored = restored.into_classifier();

        assert_eq!(restored.describe(), nb.describe());
        let probe = Instance::new(vec![0.2, f64::NAN], 1.0);
        assert_eq!(
            restored.predict_distribution(&probe).unwrap(),
            nb.predict_distribution(&probe).unwrap()
        );
    }
}
