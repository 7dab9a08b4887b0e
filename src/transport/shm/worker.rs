use super::layout::*;
use super::segment::Segment;
use crate::core::instance_header::Schema;
use crate::protocol::{CommandMessage, ProtocolError};
use crate::transport::{Transport, TransportError};
use log::{debug, info};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How long to wait for a host that has sized the segment but not yet
/// published its header.
const ATTACH_PATIENCE: Duration = Duration::from_secs(2);

/// Worker side of the shared-memory channel.
#[derive(Debug)]
pub struct ShmTransport {
    segment: Segment,
}

impl ShmTransport {
    /// Creates the segment at `path` when it is missing or empty. Otherwise
    /// attaches to the host's segment, checks its schema and adopts its row
    /// capacity.
    pub fn open(path: &Path, schema: Schema, max_rows: usize) -> Result<Self, TransportError> {
        let initialised = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);

        let segment = if initialised {
            let segment = Segment::attach_within(path, ATTACH_PATIENCE)?;
            let layout = segment.layout();
            if layout.feature_count() != schema.feature_count
                || layout.class_count() != schema.class_count
            {
                return Err(TransportError::BadSegment(format!(
                    "segment schema ({} features, {} classes) does not match {schema}",
                    layout.feature_count(),
                    layout.class_count()
                )));
            }
            info!(
                "Attached to segment {} ({} rows)",
                path.display(),
                layout.max_rows()
            );
            segment
        } else {
            let layout = Layout::new(schema.feature_count, schema.class_count, max_rows)?;
            let segment = Segment::create(path, layout)?;
            info!("Created segment {} ({max_rows} rows)", path.display());
            segment
        };

        Ok(Self { segment })
    }

    /// Rows the host can send in a single request.
    pub fn max_rows(&self) -> usize {
        self.segment.layout().max_rows()
    }

    pub fn path(&self) -> &Path {
        self.segment.path()
    }

    fn respond(&mut self, status: u32, count: usize) {
        self.segment.store(OFF_STATUS, status);
        self.segment.store(OFF_COUNT, count as u32);
        self.segment.lower(OFF_REQUEST);
        self.segment.raise(OFF_RESPONSE);
    }
}

impl Transport for ShmTransport {
    fn receive_command(&mut self) -> Result<CommandMessage, TransportError> {
        self.segment.wait_raised(OFF_REQUEST);

        let layout = *self.segment.layout();
        let opcode = (self.segment.load(OFF_OPCODE) & 0xFF) as u8;
        let count = self.segment.load(OFF_COUNT) as usize;
        if count > layout.max_rows() {
            return Err(TransportError::Malformed(format!(
                "count {count} exceeds segment capacity of {} rows",
                layout.max_rows()
            )));
        }

        let features = self
            .segment
            .read_f64s(layout.features_offset(), count * layout.feature_count());
        let feature_rows = if layout.feature_count() == 0 {
            vec![Vec::new(); count]
        } else {
            features
                .chunks_exact(layout.feature_count())
                .map(<[f64]>::to_vec)
                .collect()
        };
        let weights = self.segment.read_f64s(layout.weights_offset(), count);

        debug!("Received '{}' with {count} rows", opcode as char);
        Ok(CommandMessage {
            opcode,
            feature_rows,
            weights,
            count,
        })
    }

    fn receive_path_message(&mut self) -> Result<String, TransportError> {
        let len = self.segment.load(OFF_MSG_LEN) as usize;
        if len > MESSAGE_CAPACITY {
            return Err(TransportError::Malformed(format!(
                "path of {len} bytes exceeds message area of {MESSAGE_CAPACITY}"
            )));
        }
        let bytes = self
            .segment
            .read_bytes(self.segment.layout().message_offset(), len);
        String::from_utf8(bytes)
            .map_err(|e| TransportError::Malformed(format!("path is not UTF-8: {e}")))
    }

    fn send_ack(&mut self) -> Result<(), TransportError> {
        self.segment.store(OFF_MSG_LEN, 0);
        self.respond(STATUS_OK, 0);
        Ok(())
    }

    fn send_distribution(&mut self, distribution: &[f64]) -> Result<(), TransportError> {
        let class_count = self.segment.layout().class_count();
        if distribution.len() != class_count {
            return Err(TransportError::BadSegment(format!(
                "distribution of {} values does not fit {class_count} classes",
                distribution.len()
            )));
        }
        self.segment
            .write_f64s(self.segment.layout().distribution_offset(), distribution);
        self.segment.store(OFF_MSG_LEN, 0);
        self.respond(STATUS_OK, distribution.len());
        Ok(())
    }

    fn send_failure(&mut self, error: &ProtocolError) -> Result<(), TransportError> {
        let reason = error.to_string();
        let text = truncate_at_char_boundary(&reason, MESSAGE_CAPACITY);
        self.segment
            .write_bytes(self.segment.layout().message_offset(), text.as_bytes());
        self.segment.store(OFF_MSG_LEN, text.len() as u32);
        self.respond(STATUS_FAILURE, 0);
        Ok(())
    }
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
