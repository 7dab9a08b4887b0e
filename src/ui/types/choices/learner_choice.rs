use crate::classifiers::Classifier;
use crate::classifiers::bayes::{NaiveBayes, NaiveBayesParams};
use crate::classifiers::rules::{MajorityClass, MajorityClassParams};
use crate::ui::types::choices::UIChoice;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumDiscriminants, EnumIter, EnumMessage, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
#[strum_discriminants(name(LearnerKind))]
#[strum_discriminants(derive(EnumIter, EnumString, Display, IntoStaticStr, EnumMessage))]
#[strum_discriminants(strum(serialize_all = "kebab-case"))]
pub enum LearnerChoice {
    #[strum_discriminants(strum(
        message = "Naive Bayes",
        detailed_message = "Gaussian/multinomial Naive Bayes with additive smoothing."
    ))]
    NaiveBayes(NaiveBayesParams),

    #[strum_discriminants(strum(
        message = "Majority Class",
        detailed_message = "Predicts the weighted class frequencies seen in training."
    ))]
    MajorityClass(MajorityClassParams),
}

impl LearnerChoice {
    pub fn kind(&self) -> LearnerKind {
        LearnerKind::from(self)
    }

    pub fn build(self) -> Box<dyn Classifier> {
        match self {
            LearnerChoice::NaiveBayes(params) => Box::new(NaiveBayes::with_params(params)),
            LearnerChoice::MajorityClass(_) => Box::new(MajorityClass::new()),
        }
    }
}

impl UIChoice for LearnerChoice {
    type Kind = LearnerKind;

    fn default_params(kind: Self::Kind) -> Result<Value> {
        let params = match kind {
            LearnerKind::NaiveBayes => serde_json::to_value(NaiveBayesParams::default())?,
            LearnerKind::MajorityClass => serde_json::to_value(MajorityClassParams::default())?,
        };
        Ok(params)
    }
}
