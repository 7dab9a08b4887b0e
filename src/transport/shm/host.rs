use super::layout::*;
use super::segment::Segment;
use crate::core::instance_header::Schema;
use crate::transport::TransportError;
use std::path::Path;

/// What the worker answered to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum HostResponse {
    Ack,
    Distribution(Vec<f64>),
    Failure(String),
}

/// Host side of the shared-memory channel, for hosts written in Rust and
/// for exercising the worker in tests.
///
/// A request must be answered (`await_response`) before the next one is
/// sent. Exit is never answered.
#[derive(Debug)]
pub struct ShmHost {
    segment: Segment,
}

impl ShmHost {
    pub fn create(path: &Path, schema: Schema, max_rows: usize) -> Result<Self, TransportError> {
        let layout = Layout::new(schema.feature_count, schema.class_count, max_rows)?;
        Ok(Self {
            segment: Segment::create(path, layout)?,
        })
    }

    pub fn attach(path: &Path) -> Result<Self, TransportError> {
        Ok(Self {
            segment: Segment::attach(path)?,
        })
    }

    pub fn schema(&self) -> Schema {
        let layout = self.segment.layout();
        Schema {
            feature_count: layout.feature_count(),
            class_count: layout.class_count(),
        }
    }

    pub fn max_rows(&self) -> usize {
        self.segment.layout().max_rows()
    }

    /// Publishes a command with `rows.len()` feature rows and their weights.
    pub fn send_rows(
        &self,
        opcode: u8,
        rows: &[Vec<f64>],
        weights: &[f64],
    ) -> Result<(), TransportError> {
        let layout = *self.segment.layout();
        if rows.len() != weights.len() {
            return Err(TransportError::Malformed(format!(
                "{} rows but {} weights",
                rows.len(),
                weights.len()
            )));
        }
        if rows.len() > layout.max_rows() {
            return Err(TransportError::Malformed(format!(
                "{} rows exceed segment capacity of {}",
                rows.len(),
                layout.max_rows()
            )));
        }

        let mut offset = layout.features_offset();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != layout.feature_count() {
                return Err(TransportError::Malformed(format!(
                    "row {i} has {} features, segment has {}",
                    row.len(),
                    layout.feature_count()
                )));
            }
            self.segment.write_f64s(offset, row);
            offset += row.len() * 8;
        }
        self.segment.write_f64s(layout.weights_offset(), weights);
        self.publish_raw(opcode, rows.len());
        Ok(())
    }

    /// Publishes a command carrying no rows.
    pub fn send_bare(&self, opcode: u8) {
        self.publish_raw(opcode, 0);
    }

    /// Publishes a path-bearing command.
    pub fn send_path(&self, opcode: u8, path: &str) -> Result<(), TransportError> {
        if path.len() > MESSAGE_CAPACITY {
            return Err(TransportError::Malformed(format!(
                "path of {} bytes exceeds message area of {MESSAGE_CAPACITY}",
                path.len()
            )));
        }
        self.segment
            .write_bytes(self.segment.layout().message_offset(), path.as_bytes());
        self.segment.store(OFF_MSG_LEN, path.len() as u32);
        self.publish_raw(opcode, 0);
        Ok(())
    }

    /// Writes the opcode and count words and raises the request flag. The
    /// count is not checked against the segment capacity.
    pub fn publish_raw(&self, opcode: u8, count: usize) {
        self.segment.store(OFF_OPCODE, u32::from(opcode));
        self.segment.store(OFF_COUNT, count as u32);
        self.segment.raise(OFF_REQUEST);
    }

    /// Blocks until the worker answers the outstanding request.
    pub fn await_response(&self) -> Result<HostResponse, TransportError> {
        self.segment.wait_raised(OFF_RESPONSE);
        let layout = *self.segment.layout();

        let response = match self.segment.load(OFF_STATUS) {
            STATUS_OK => match self.segment.load(OFF_COUNT) as usize {
                0 => HostResponse::Ack,
                n if n == layout.class_count() => HostResponse::Distribution(
                    self.segment.read_f64s(layout.distribution_offset(), n),
                ),
                n => {
                    self.segment.lower(OFF_RESPONSE);
                    return Err(TransportError::Malformed(format!(
                        "distribution of {n} values for {} classes",
                        layout.class_count()
                    )));
                }
            },
            STATUS_FAILURE => {
                let len = (self.segment.load(OFF_MSG_LEN) as usize).min(MESSAGE_CAPACITY);
                let bytes = self.segment.read_bytes(layout.message_offset(), len);
                HostResponse::Failure(String::from_utf8_lossy(&bytes).into_owned())
            }
            other => {
                self.segment.lower(OFF_RESPONSE);
                return Err(TransportError::Malformed(format!(
                    "unknown response status {other}"
                )));
            }
        };

        self.segment.lower(OFF_RESPONSE);
        Ok(response)
    }

    pub fn request_rows(
        &self,
        opcode: u8,
        rows: &[Vec<f64>],
        weights: &[f64],
    ) -> Result<HostResponse, TransportError> {
        self.send_rows(opcode, rows, weights)?;
        self.await_response()
    }

    pub fn request_bare(&self, opcode: u8) -> Result<HostResponse, TransportError> {
        self.send_bare(opcode);
        self.await_response()
    }

    pub fn request_path(&self, opcode: u8, path: &str) -> Result<HostResponse, TransportError> {
        self.send_path(opcode, path)?;
        self.await_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolError;
    use crate::transport::Transport;
    use crate::transport::shm::ShmTransport;
    use std::thread;
    use tempfile::tempdir;

    const SCHEMA: Schema = Schema {
        feature_count: 2,
        class_count: 3,
    };

    #[test]
    fn request_response_round_trip_across_threads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");
        let host = ShmHost::create(&path, SCHEMA, 4).unwrap();
        let mut worker = ShmTransport::open(&path, SCHEMA, 4).unwrap();

        let handle = thread::spawn(move || {
            let cmd = worker.receive_command().unwrap();
            assert_eq!(cmd.opcode, b'a');
            assert_eq!(cmd.count, 2);
            assert_eq!(cmd.feature_rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
            assert_eq!(cmd.weights, vec![0.5, 1.5]);
            worker.send_ack().unwrap();

            let cmd = worker.receive_command().unwrap();
            assert_eq!(cmd.opcode, b'c');
            worker.send_distribution(&[0.2, 0.3, 0.5]).unwrap();

            let cmd = worker.receive_command().unwrap();
            assert_eq!(cmd.opcode, b's');
            assert_eq!(worker.receive_path_message().unwrap(), "/tmp/model.json");
            worker
                .send_failure(&ProtocolError::ClassifyCount(0))
                .unwrap();
        });

        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(
            host.request_rows(b'a', &rows, &[0.5, 1.5]).unwrap(),
            HostResponse::Ack
        );
        assert_eq!(
            host.request_rows(b'c', &rows[..1], &[1.0]).unwrap(),
            HostResponse::Distribution(vec![0.2, 0.3, 0.5])
        );
        match host.request_path(b's', "/tmp/model.json").unwrap() {
            HostResponse::Failure(reason) => assert!(reason.contains("exactly one row")),
            other => panic!("unexpected response {other:?}"),
        }
        handle.join().unwrap();
    }

    #[test]
    fn send_rows_validates_shape() {
        let dir = tempdir().unwrap();
        let host = ShmHost::create(&dir.path().join("seg"), SCHEMA, 1).unwrap();
        assert!(host.send_rows(b'a', &[vec![1.0]], &[1.0]).is_err());
        assert!(host.send_rows(b'a', &[vec![1.0, 2.0]], &[]).is_err());
        assert!(
            host.send_rows(b'a', &[vec![1.0, 2.0], vec![1.0, 2.0]], &[1.0, 1.0])
                .is_err()
        );
        assert!(host.send_path(b's', &"x".repeat(MESSAGE_CAPACITY + 1)).is_err());
    }
}
