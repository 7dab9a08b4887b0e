//! Payload rows to instances. The only check made here is that each row
//! matches the schema's feature count.

use crate::core::instance::Instance;
use crate::core::instance_header::Schema;
use crate::protocol::ProtocolError;

pub fn decode_row(schema: &Schema, features: &[f64], weight: f64) -> Result<Instance, ProtocolError> {
    decode_row_at(schema, 0, features, weight)
}

fn decode_row_at(
    schema: &Schema,
    row: usize,
    features: &[f64],
    weight: f64,
) -> Result<Instance, ProtocolError> {
    if features.len() != schema.feature_count {
        return Err(ProtocolError::FeatureCount {
            row,
            expected: schema.feature_count,
            found: features.len(),
        });
    }
    Ok(Instance::new(features.to_vec(), weight))
}

/// Decodes the first `n` rows; `n` must be at least one.
pub fn decode_batch(
    schema: &Schema,
    rows: &[Vec<f64>],
    weights: &[f64],
    n: usize,
) -> Result<Vec<Instance>, ProtocolError> {
    if n == 0 {
        return Err(ProtocolError::Malformed("empty batch".into()));
    }
    if rows.len() < n || weights.len() < n {
        return Err(ProtocolError::MissingRows {
            count: n,
            rows: rows.len(),
            weights: weights.len(),
        });
    }

    rows[..n]
        .iter()
        .zip(&weights[..n])
        .enumerate()
        .map(|(i, (row, &w))| decode_row_at(schema, i, row, w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: Schema = Schema {
        feature_count: 3,
        class_count: 2,
    };

    #[test]
    fn decode_row_keeps_values_and_weight() {
        let inst = decode_row(&SCHEMA, &[1.0, 2.0, 0.0], 0.5).unwrap();
        assert_eq!(inst.values(), &[1.0, 2.0, 0.0]);
        assert_eq!(inst.weight(), 0.5);
    }

    #[test]
    fn decode_row_rejects_wrong_width() {
        let err = decode_row(&SCHEMA, &[1.0, 2.0], 1.0).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::FeatureCount {
                row: 0,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn decode_batch_takes_first_n_rows() {
        let rows = vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0], vec![9.0; 3]];
        let weights = vec![1.0, 2.0, 3.0];
        let batch = decode_batch(&SCHEMA, &rows, &weights, 2).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].weight(), 2.0);
    }

    #[test]
    fn decode_batch_reports_offending_row() {
        let rows = vec![vec![0.0, 0.0, 0.0], vec![1.0]];
        let err = decode_batch(&SCHEMA, &rows, &[1.0, 1.0], 2).unwrap_err();
        assert!(matches!(err, ProtocolError::FeatureCount { row: 1, .. }));
    }

    #[test]
    fn decode_batch_rejects_short_payload_and_zero() {
        let rows = vec![vec![0.0, 0.0, 0.0]];
        assert!(matches!(
            decode_batch(&SCHEMA, &rows, &[1.0], 2),
            Err(ProtocolError::MissingRows { .. })
        ));
        assert!(decode_batch(&SCHEMA, &rows, &[1.0], 0).is_err());
    }
}
