// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable change stream persistence
//!
//! Newline-delimited JSON, one change record per line, each carrying its
//! own checksum. Replay verifies every record and reports the first
//! corrupt line rather than silently materializing bad state.

use crate::error::StoreError;
use crate::stream::ChangeRecord;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append-only on-disk log of change records
pub struct DurableStream {
    file: File,
    path: PathBuf,
}

impl DurableStream {
    /// Open or create a stream log at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Append one change record
    pub fn append(&mut self, record: &ChangeRecord) -> Result<(), StoreError> {
        let line = record.to_line()?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record, verifying checksums
    pub fn replay(path: &Path) -> Result<Vec<ChangeRecord>, StoreError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record = ChangeRecord::from_line(&line)?;
            if !record.verify() {
                return Err(StoreError::ChecksumMismatch {
                    sequence: record.sequence,
                });
            }
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
#[path = "durable_tests.rs"]
mod tests;
