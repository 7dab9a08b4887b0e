//! Model files: a JSON document carrying the session schema and the tagged
//! learner snapshot.

use crate::classifiers::{Classifier, ClassifierError, LearnerSnapshot};
use crate::core::instance_header::Schema;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelFile {
    pub format_version: u32,
    pub feature_count: usize,
    pub class_count: usize,
    pub learner: LearnerSnapshot,
}

impl ModelFile {
    pub fn schema(&self) -> Schema {
        Schema {
            feature_count: self.feature_count,
            class_count: self.class_count,
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid model file {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported model format version {0}")]
    UnsupportedVersion(u32),

    #[error("model was built for {found}, session has {expected}")]
    SchemaMismatch { expected: Schema, found: Schema },

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn save_classifier(
    path: &Path,
    schema: Schema,
    classifier: &dyn Classifier,
) -> Result<(), PersistenceError> {
    let model = ModelFile {
        format_version: MODEL_FORMAT_VERSION,
        feature_count: schema.feature_count,
        class_count: schema.class_count,
        learner: classifier.snapshot()?,
    };

    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &model).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error(path))
}

/// Reads a model file and rebuilds its classifier, refusing models whose
/// schema differs from `schema`.
pub fn load_classifier(path: &Path, schema: Schema) -> Result<Box<dyn Classifier>, PersistenceError> {
    let file = File::open(path).map_err(io_error(path))?;
    let model: ModelFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| PersistenceError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if model.format_version != MODEL_FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(model.format_version));
    }
    let found = model.schema();
    let learner_fits = model.learner.number_of_classes() == schema.class_count
        && model.learner.number_of_attributes() == schema.feature_count + 1;
    if found != schema || !learner_fits {
        return Err(PersistenceError::SchemaMismatch {
            expected: schema,
            found,
        });
    }
    Ok(model.learner.into_classifier())
}

pub fn write_description(path: &Path, description: &str) -> Result<(), PersistenceError> {
    fs::write(path, description).map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::rules::MajorityClass;
    use crate::core::attributes::{AttributeRef, NominalAttribute, NumericAttribute};
    use crate::core::dataset::TrainingDataset;
    use crate::core::instance::Instance;
    use crate::core::instance_header::InstanceHeader;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn trained_majority() -> (MajorityClass, Schema) {
        let header = Arc::new(InstanceHeader::new(
            "r".into(),
            vec![
                Arc::new(NumericAttribute::new("x".into())) as AttributeRef,
                Arc::new(NominalAttribute::with_values(
                    "c".into(),
                    vec!["a".into(), "b".into()],
                )) as AttributeRef,
            ],
            1,
        ));
        let mut mc = MajorityClass::new();
        mc.set_model_context(Arc::clone(&header));
        mc.train(&TrainingDataset::from_instances(vec![
            Instance::new(vec![1.0, 1.0], 2.0),
            Instance::new(vec![2.0, 0.0], 1.0),
        ]))
        .unwrap();
        (mc, header.schema())
    }

    #[test]
    fn save_then_load_restores_description() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let (mc, schema) = trained_majority();

        save_classifier(&path, schema, &mc).unwrap();
        let loaded = load_classifier(&path, schema).unwrap();
        assert_eq!(loaded.describe(), mc.describe());
        assert_eq!(loaded.name(), "majority-class");
    }

    #[test]
    fn model_file_is_tagged_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let (mc, schema) = trained_majority();
        save_classifier(&path, schema, &mc).unwrap();

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["format_version"], 1);
        assert_eq!(v["class_count"], 2);
        assert_eq!(v["learner"]["type"], "majority-class");
    }

    #[test]
    fn load_rejects_other_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let (mc, schema) = trained_majority();
        save_classifier(&path, schema, &mc).unwrap();

        let other = Schema {
            feature_count: 2,
            class_count: 3,
        };
        assert!(matches!(
            load_classifier(&path, other),
            Err(PersistenceError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn load_rejects_learner_built_for_other_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let (mc, schema) = trained_majority();
        save_classifier(&path, schema, &mc).unwrap();

        let mut v: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        v["learner"]["state"]["number_of_attributes"] = 5.into();
        fs::write(&path, v.to_string()).unwrap();

        assert!(matches!(
            load_classifier(&path, schema),
            Err(PersistenceError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn load_reports_missing_and_corrupt_files() {
        let dir = tempdir().unwrap();
        let (_, schema) = trained_majority();

        let missing = dir.path().join("none.json");
        assert!(matches!(
            load_classifier(&missing, schema),
            Err(PersistenceError::Io { .. })
        ));

        let corrupt = dir.path().join("bad.json");
        fs::write(&corrupt, "{not json").unwrap();
        assert!(matches!(
            load_classifier(&corrupt, schema),
            Err(PersistenceError::Json { .. })
        ));
    }

    #[test]
    fn write_description_writes_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.txt");
        write_description(&path, "line one\nline two\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "line one\nline two\n");
        assert!(write_description(&dir.path().join("no/such/dir.txt"), "x").is_err());
    }
}
