use crate::core::instance::Instance;
use crate::core::instance_header::InstanceHeader;
use crate::streams::arff::parser::{is_comment_or_empty, parse_header, parse_instance_values};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader, Error};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads an ARFF file: the header eagerly, data rows lazily as unit-weight
/// instances. Rows that fail to parse are logged and skipped.
#[derive(Debug)]
pub struct ArffFileStream {
    path: PathBuf,
    reader: BufReader<File>,
    header: Arc<InstanceHeader>,
    line_number: usize,
    finished: bool,
}

impl ArffFileStream {
    pub fn open(path: &Path, class_index: Option<usize>) -> Result<Self, Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header = parse_header(&mut reader, class_index)?;

        Ok(ArffFileStream {
            path: path.to_path_buf(),
            reader,
            header: Arc::new(header),
            line_number: 0,
            finished: false,
        })
    }

    pub fn header(&self) -> Arc<InstanceHeader> {
        Arc::clone(&self.header)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next parsed data row. I/O errors end the stream and are returned.
    pub fn next_instance(&mut self) -> Result<Option<Instance>, Error> {
        let mut line = String::new();
        while !self.finished {
            line.clear();
            let n = match self.reader.read_line(&mut line) {
                Ok(n) => n,
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            };
            if n == 0 {
                self.finished = true;
                break;
            }
            self.line_number += 1;
            if is_comment_or_empty(&line) {
                continue;
            }

            match parse_instance_values(&self.header, line.trim()) {
                Ok(values) => return Ok(Some(Instance::new(values, 1.0))),
                Err(e) => warn!(
                    "{}: skipping data row {}: {e}",
                    self.path.display(),
                    self.line_number
                ),
            }
        }
        Ok(None)
    }

    /// Drains the remaining rows.
    pub fn read_all(&mut self) -> Result<Vec<Instance>, Error> {
        let mut out = Vec::new();
        while let Some(inst) = self.next_instance()? {
            out.push(inst);
        }
        Ok(out)
    }

    pub fn has_more_instances(&self) -> bool {
        !self.finished
    }
}
