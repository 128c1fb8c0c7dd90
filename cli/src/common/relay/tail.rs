//! # wslbash Staging Tail (`common::relay::tail`)
//!
//! File: cli/src/common/relay/tail.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `StagingTail` is the synchronous core of the output relay. It owns the
//! relay cursor (the offset of the first byte not yet emitted) and the last
//! file length it observed.
//!
//! A poll compares the file's current length with the last observed one.
//! Only growth triggers a read: the file is opened with a shared-read mode,
//! the range `[cursor, length)` is read, everything up to and including the
//! last `\n` is written out, and the cursor moves past it. A trailing partial
//! line stays behind the cursor until its terminator arrives or the final
//! drain flushes it.
//!
//! The length is re-read on every poll and the read is bounded by it, so the
//! cursor never passes bytes the writer had not yet produced when the length
//! was sampled.
//!
use crate::common::fs::shared::open_shared_read;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Incremental reader over the growing staging file.
#[derive(Debug)]
pub struct StagingTail {
    path: PathBuf,
    cursor: u64,
    observed_len: u64,
    reads: u64,
}

impl StagingTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cursor: 0,
            observed_len: 0,
            reads: 0,
        }
    }

    /// Offset of the first byte not yet emitted.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Number of times the file content has been read.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn read_from_cursor(&mut self, limit: Option<u64>) -> io::Result<Vec<u8>> {
        let mut file = open_shared_read(&self.path)?;
        file.seek(SeekFrom::Start(self.cursor))?;
        let mut buf = Vec::new();
        match limit {
            Some(len) => {
                file.take(len.saturating_sub(self.cursor))
                    .read_to_end(&mut buf)?;
            }
            None => {
                file.read_to_end(&mut buf)?;
            }
        }
        self.reads += 1;
        Ok(buf)
    }

    /// Emits the complete lines appended since the last poll.
    ///
    /// Returns the number of bytes written to `out`. If the file has not
    /// grown, nothing is opened or read.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from reading the file or writing `out`. The
    /// cursor is only advanced after the bytes were written.
    pub fn poll<W: Write>(&mut self, out: &mut W) -> io::Result<u64> {
        let len = fs::metadata(&self.path)?.len();
        if len <= self.observed_len {
            return Ok(0);
        }

        let chunk = self.read_from_cursor(Some(len))?;
        self.observed_len = len;

        let Some(last_newline) = chunk.iter().rposition(|&b| b == b'\n') else {
            return Ok(0);
        };
        let complete = &chunk[..=last_newline];
        out.write_all(complete)?;
        out.flush()?;
        self.cursor += complete.len() as u64;
        Ok(complete.len() as u64)
    }

    /// Reads everything from the cursor to the current end of the file.
    ///
    /// Nothing is emitted; pass the bytes to `finish` once the read has
    /// succeeded.
    pub fn read_remaining(&mut self) -> io::Result<Vec<u8>> {
        self.read_from_cursor(None)
    }

    /// Writes the final bytes, terminating an unterminated last line.
    pub fn finish<W: Write>(&mut self, bytes: &[u8], out: &mut W) -> io::Result<u64> {
        out.write_all(bytes)?;
        if bytes.last().is_some_and(|&b| b != b'\n') {
            out.write_all(b"\n")?;
        }
        out.flush()?;
        self.cursor += bytes.len() as u64;
        self.observed_len = self.observed_len.max(self.cursor);
        Ok(bytes.len() as u64)
    }
}
