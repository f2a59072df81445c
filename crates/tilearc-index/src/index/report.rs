//! Streaming ingestion of textual archive reports
//!
//! Very large archives are indexed from a verbose directory listing (the
//! output of `zipinfo -v`) instead of parsing the central directory in
//! memory. Each entry block looks like:
//!
//! ```text
//! Central directory entry #3:
//! ---------------------------
//!
//!   tiles/0/0/0.b3dm
//!
//!   offset of local header from start of archive:   1234
//!                                                   (00000000000004D2h) bytes
//! ```
//!
//! The line scanner is a three-state machine driven by [`transition`], which
//! is pure and does no I/O. [`ReportEntries`] feeds it one line at a time from
//! any [`BufRead`], so the report is never held in memory and a caller can
//! stop consuming at any point.

use crate::error::IndexResult;
use std::io::BufRead;
use tracing::warn;

/// Marker that opens an entry block
pub const ENTRY_HEADER_MARKER: &str = "Central directory entry #";

/// Marker preceding the decimal local header offset
pub const OFFSET_MARKER: &str = "offset of local header from start of archive:";

/// Entry path and offset recovered from a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Entry path as printed in the report
    pub path: String,
    /// Local header offset
    pub offset: u64,
}

/// Scanner state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Looking for the next entry header line
    #[default]
    ScanningForEntryHeader,
    /// Entry header seen, waiting for the path line
    AwaitingPath,
    /// Path seen, waiting for the offset line
    AwaitingOffset {
        /// Path of the pending entry
        path: String,
    },
}

/// Why a pending entry was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftReason {
    /// A new entry header arrived before the pending entry's path
    MissingPath,
    /// A new entry header arrived before the pending entry's offset
    MissingOffset {
        /// Path of the dropped entry
        path: String,
    },
    /// The offset line did not hold a decimal number
    InvalidOffset {
        /// Path of the dropped entry
        path: String,
        /// Offending line
        line: String,
    },
}

/// Result of feeding one line to the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to report
    Continue,
    /// A complete entry was recognized
    Emit(ReportEntry),
    /// The pending entry was dropped
    Drift(DriftReason),
}

/// Advance the scanner by one line
pub fn transition(state: ScanState, line: &str) -> (ScanState, Step) {
    match state {
        ScanState::ScanningForEntryHeader => {
            if is_entry_header(line) {
                (ScanState::AwaitingPath, Step::Continue)
            } else {
                (ScanState::ScanningForEntryHeader, Step::Continue)
            }
        }
        ScanState::AwaitingPath => {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') {
                (ScanState::AwaitingPath, Step::Continue)
            } else if is_entry_header(line) {
                // The new header opens its own block
                (ScanState::AwaitingPath, Step::Drift(DriftReason::MissingPath))
            } else {
                (
                    ScanState::AwaitingOffset {
                        path: trimmed.to_string(),
                    },
                    Step::Continue,
                )
            }
        }
        ScanState::AwaitingOffset { path } => {
            if let Some(position) = line.find(OFFSET_MARKER) {
                let value = &line[position + OFFSET_MARKER.len()..];
                match parse_offset(value) {
                    Some(offset) => (
                        ScanState::ScanningForEntryHeader,
                        Step::Emit(ReportEntry { path, offset }),
                    ),
                    None => (
                        ScanState::ScanningForEntryHeader,
                        Step::Drift(DriftReason::InvalidOffset {
                            path,
                            line: line.to_string(),
                        }),
                    ),
                }
            } else if is_entry_header(line) {
                (
                    ScanState::AwaitingPath,
                    Step::Drift(DriftReason::MissingOffset { path }),
                )
            } else {
                (ScanState::AwaitingOffset { path }, Step::Continue)
            }
        }
    }
}

fn is_entry_header(line: &str) -> bool {
    line.contains(ENTRY_HEADER_MARKER)
}

fn parse_offset(value: &str) -> Option<u64> {
    let value = value.trim_start();
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value, |end| &value[..end]);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Iterator over the entries of a streamed report
///
/// Yields entries as their offset line is read. Dropped entries are counted
/// in [`skipped`](Self::skipped) and logged. An entry still pending when the
/// input ends counts as skipped.
pub struct ReportEntries<R: BufRead> {
    reader: R,
    state: ScanState,
    buffer: Vec<u8>,
    lines: u64,
    skipped: usize,
    finished: bool,
}

impl<R: BufRead> ReportEntries<R> {
    /// Start scanning a report
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: ScanState::default(),
            buffer: Vec::with_capacity(256),
            lines: 0,
            skipped: 0,
            finished: false,
        }
    }

    /// Number of entries dropped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.lines
    }

    /// Current scanner state
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    fn record_drift(&mut self, reason: &DriftReason) {
        self.skipped += 1;
        match reason {
            DriftReason::MissingPath => {
                warn!("Line {}: entry header without a path, skipping entry", self.lines);
            }
            DriftReason::MissingOffset { path } => {
                warn!("Line {}: no local header offset for {path}, skipping entry", self.lines);
            }
            DriftReason::InvalidOffset { path, line } => {
                warn!(
                    "Line {}: unreadable offset for {path} ({}), skipping entry",
                    self.lines,
                    line.trim()
                );
            }
        }
    }
}

impl<R: BufRead> Iterator for ReportEntries<R> {
    type Item = IndexResult<ReportEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => {
                    self.finished = true;
                    if let ScanState::AwaitingOffset { path } = std::mem::take(&mut self.state) {
                        self.record_drift(&DriftReason::MissingOffset { path });
                    }
                }
                Ok(_) => {
                    self.lines += 1;
                    let line = String::from_utf8_lossy(&self.buffer)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    let (next, step) = transition(std::mem::take(&mut self.state), &line);
                    self.state = next;
                    match step {
                        Step::Continue => {}
                        Step::Emit(entry) => return Some(Ok(entry)),
                        Step::Drift(reason) => self.record_drift(&reason),
                    }
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}
