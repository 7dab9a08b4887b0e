use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueHint};
use serde_json::{Map, Value};

use crate::ui::types::choices::{LearnerChoice, UIChoice};

pub const DEFAULT_MAX_ROWS: u32 = 1024;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Shared-memory worker serving a rivu learner to a host process"
)]
pub struct Cli {
    /// Shared-memory segment file (created when missing or empty)
    #[arg(value_name = "SEGMENT", value_hint = ValueHint::FilePath)]
    pub segment: PathBuf,

    /// ARFF file with the header and seed instances (class = last attribute)
    #[arg(value_name = "DATA", value_hint = ValueHint::FilePath)]
    pub data: PathBuf,

    /// Learner to use (e.g. naive-bayes, MajorityClass)
    #[arg(value_name = "LEARNER")]
    pub learner: String,

    /// Learner parameters (key=value, nested keys with dots)
    #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub learner_params: Vec<KeyValue>,

    /// Rows per request when this worker creates the segment
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ROWS,
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub max_rows: u32,
}

#[derive(Clone, Debug)]
pub struct KeyValue {
    key: String,
    value: Value,
}

impl Cli {
    pub fn learner_choice(&self) -> Result<LearnerChoice> {
        build_choice::<LearnerChoice>(&self.learner, &self.learner_params)
            .with_context(|| format!("invalid learner '{}'", self.learner))
    }
}

fn build_choice<C>(kind_input: &str, overrides: &[KeyValue]) -> Result<C>
where
    C: UIChoice,
    C::Kind: FromStr,
    <C::Kind as FromStr>::Err: std::fmt::Display,
{
    let kind = parse_kind::<C::Kind>(kind_input)?;
    let mut params = C::default_params(kind)?;
    apply_overrides(&mut params, overrides)?;
    C::from_parts(kind, params)
}

fn parse_kind<T>(raw: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    candidate_spellings(raw)
        .iter()
        .find_map(|cand| cand.parse::<T>().ok())
        .ok_or_else(|| anyhow!("could not parse value '{raw}'"))
}

fn candidate_spellings(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return out;
    }

    out.push(trimmed.to_string());
    out.push(trimmed.to_lowercase());
    out.push(kebab_from_token(trimmed));
    out.push(trimmed.replace('_', "-"));
    out.sort();
    out.dedup();
    out
}

fn kebab_from_token(token: &str) -> String {
    let mut buf = String::new();
    let mut prev_lower = false;
    for ch in token.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                buf.push('-');
            }
            buf.extend(ch.to_lowercase());
            prev_lower = false;
        } else if ch == '_' {
            buf.push('-');
            prev_lower = false;
        } else {
            buf.push(ch);
            prev_lower = ch.is_lowercase();
        }
    }
    buf
}

fn apply_overrides(target: &mut Value, overrides: &[KeyValue]) -> Result<()> {
    for kv in overrides {
        set_path(target, &kv.key, kv.value.clone())
            .with_context(|| format!("failed to set '{}'", kv.key))?;
    }
    Ok(())
}

fn set_path(target: &mut Value, path: &str, new_value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        bail!("empty key is not allowed");
    };

    let mut current = target;
    for seg in parents {
        current = ensure_object(current)?
            .entry((*seg).to_string())
            .or_insert(Value::Null);
    }
    ensure_object(current)?.insert((*last).to_string(), new_value);
    Ok(())
}

fn ensure_object(value: &mut Value) -> Result<&mut Map<String, Value>> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("cannot set nested field on non-object value: {other:?}"),
    }
}

fn parse_key_value(raw: &str) -> Result<KeyValue, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| "expected KEY=VALUE".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("key cannot be empty".to_string());
    }

    Ok(KeyValue {
        key: key.to_string(),
        value: parse_literal(value.trim()),
    })
}

/// JSON literal when it parses as one, plain string otherwise.
fn parse_literal(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::types::choices::LearnerKind;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rivu-bridge").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn positional_arguments_and_defaults() {
        let cli = parse(&["/dev/shm/seg", "data.arff", "naive-bayes"]);
        assert_eq!(cli.segment, PathBuf::from("/dev/shm/seg"));
        assert_eq!(cli.data, PathBuf::from("data.arff"));
        assert_eq!(cli.max_rows, DEFAULT_MAX_ROWS);
        assert!(cli.learner_params.is_empty());
        assert_eq!(cli.learner_choice().unwrap().kind(), LearnerKind::NaiveBayes);
    }

    #[test]
    fn learner_options_override_defaults() {
        let cli = parse(&[
            "--max-rows",
            "16",
            "seg",
            "data.arff",
            "NaiveBayes",
            "alpha=1",
            "min_std_dev=0.01",
        ]);
        assert_eq!(cli.max_rows, 16);
        match cli.learner_choice().unwrap() {
            LearnerChoice::NaiveBayes(p) => {
                assert_eq!(p.alpha, 1.0);
                assert_eq!(p.min_std_dev, 0.01);
            }
            other => panic!("unexpected learner {other:?}"),
        }
    }

    #[test]
    fn learner_names_accept_several_spellings() {
        for name in ["majority-class", "MajorityClass", "majority_class"] {
            let cli = parse(&["seg", "d.arff", name]);
            assert_eq!(
                cli.learner_choice().unwrap().kind(),
                LearnerKind::MajorityClass,
                "{name}"
            );
        }
        assert!(parse(&["seg", "d.arff", "perceptron"]).learner_choice().is_err());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["rivu-bridge", "seg", "d.arff"]).is_err());
        assert!(Cli::try_parse_from(["rivu-bridge", "seg", "d.arff", "nb", "novalue"]).is_err());
        assert!(
            Cli::try_parse_from(["rivu-bridge", "--max-rows", "0", "seg", "d.arff", "nb"]).is_err()
        );
    }

    #[test]
    fn kebab_from_token_handles_camel_and_snake() {
        assert_eq!(kebab_from_token("NaiveBayes"), "naive-bayes");
        assert_eq!(kebab_from_token("naive_bayes"), "naive-bayes");
        assert_eq!(kebab_from_token("naive-bayes"), "naive-bayes");
    }

    #[test]
    fn set_path_creates_nested_objects() {
        let mut v = json!({});
        set_path(&mut v, "a.b", json!(3)).unwrap();
        assert_eq!(v, json!({"a": {"b": 3}}));
        assert!(set_path(&mut v, "a.b.c", json!(1)).is_err());
        assert!(set_path(&mut v, "..", json!(1)).is_err());
    }

    #[test]
    fn literals_fall_back_to_strings() {
        assert_eq!(parse_literal("0.5"), json!(0.5));
        assert_eq!(parse_literal("true"), json!(true));
        assert_eq!(parse_literal("fast"), json!("fast"));
        assert_eq!(parse_literal(""), json!(""));
    }
}
