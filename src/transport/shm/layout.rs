use crate::transport::TransportError;

pub(super) const MAGIC: u32 = 0x5256_5342;
pub(super) const VERSION: u32 = 1;

pub(super) const OFF_MAGIC: usize = 0;
pub(super) const OFF_VERSION: usize = 4;
pub(super) const OFF_FEATURES: usize = 8;
pub(super) const OFF_CLASSES: usize = 12;
pub(super) const OFF_MAX_ROWS: usize = 16;
pub(super) const OFF_REQUEST: usize = 20;
pub(super) const OFF_RESPONSE: usize = 24;
pub(super) const OFF_OPCODE: usize = 28;
/// Rows in a request, distribution length in a response.
pub(super) const OFF_COUNT: usize = 32;
pub(super) const OFF_STATUS: usize = 36;
pub(super) const OFF_MSG_LEN: usize = 40;
pub(super) const HEADER_LEN: usize = 48;

pub(super) const STATUS_OK: u32 = 0;
pub(super) const STATUS_FAILURE: u32 = 1;

/// Bytes reserved for a path (request) or a failure reason (response).
pub const MESSAGE_CAPACITY: usize = 4096;

const F64: usize = std::mem::size_of::<f64>();

/// Sizes and offsets of the payload areas that follow the fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    feature_count: usize,
    class_count: usize,
    max_rows: usize,
    weights_offset: usize,
    distribution_offset: usize,
    message_offset: usize,
    total_len: usize,
}

impl Layout {
    pub fn new(
        feature_count: usize,
        class_count: usize,
        max_rows: usize,
    ) -> Result<Self, TransportError> {
        if max_rows == 0 {
            return Err(TransportError::BadSegment("max_rows must be positive".into()));
        }
        for (name, v) in [
            ("feature_count", feature_count),
            ("class_count", class_count),
            ("max_rows", max_rows),
        ] {
            if u32::try_from(v).is_err() {
                return Err(TransportError::BadSegment(format!("{name} {v} exceeds u32")));
            }
        }

        let too_large = || TransportError::BadSegment("segment size overflows".into());
        let feature_bytes = max_rows
            .checked_mul(feature_count)
            .and_then(|n| n.checked_mul(F64))
            .ok_or_else(too_large)?;
        let weights_offset = HEADER_LEN.checked_add(feature_bytes).ok_or_else(too_large)?;
        let distribution_offset = weights_offset
            .checked_add(max_rows * F64)
            .ok_or_else(too_large)?;
        let message_offset = distribution_offset
            .checked_add(class_count * F64)
            .ok_or_else(too_large)?;
        let total_len = message_offset
            .checked_add(MESSAGE_CAPACITY)
            .ok_or_else(too_large)?;

        Ok(Self {
            feature_count,
            class_count,
            max_rows,
            weights_offset,
            distribution_offset,
            message_offset,
            total_len,
        })
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn features_offset(&self) -> usize {
        HEADER_LEN
    }

    pub fn weights_offset(&self) -> usize {
        self.weights_offset
    }

    pub fn distribution_offset(&self) -> usize {
        self.distribution_offset
    }

    pub fn message_offset(&self) -> usize {
        self.message_offset
    }

    pub fn total_len(&self) -> usize {
        self.total_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_follow_each_other() {
        let l = Layout::new(3, 2, 10).unwrap();
        assert_eq!(l.features_offset(), 48);
        assert_eq!(l.weights_offset(), 48 + 10 * 3 * 8);
        assert_eq!(l.distribution_offset(), l.weights_offset() + 10 * 8);
        assert_eq!(l.message_offset(), l.distribution_offset() + 2 * 8);
        assert_eq!(l.total_len(), l.message_offset() + MESSAGE_CAPACITY);
    }

    #[test]
    fn float_areas_are_aligned() {
        let l = Layout::new(5, 3, 7).unwrap();
        for off in [l.features_offset(), l.weights_offset(), l.distribution_offset()] {
            assert_eq!(off % 8, 0);
        }
    }

    #[test]
    fn rejects_zero_rows_and_overflow() {
        assert!(Layout::new(2, 2, 0).is_err());
        assert!(Layout::new(u32::MAX as usize + 1, 2, 1).is_err());
    }
}
