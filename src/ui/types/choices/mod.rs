mod learner_choice;

pub use learner_choice::{LearnerChoice, LearnerKind};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt::Display;

/// A tagged `{"type": ..., "params": ...}` choice whose kind is picked by
/// name and whose params start from defaults.
pub trait UIChoice: DeserializeOwned {
    type Kind: Copy + Display;

    fn default_params(kind: Self::Kind) -> Result<Value>;

    fn from_parts(kind: Self::Kind, params: Value) -> Result<Self> {
        serde_json::from_value(json!({ "type": kind.to_string(), "params": params }))
            .with_context(|| format!("invalid parameters for '{kind}'"))
    }
}
