//! Error types for index and archive operations

use std::path::PathBuf;
use thiserror::Error;

/// Index operation result type
pub type IndexResult<T> = Result<T, IndexError>;

/// Error types for building, reading and recovering archive indices
#[derive(Debug, Error)]
pub enum IndexError {
    /// Serialized index length is not a whole number of records
    #[error("Malformed index length: {length} bytes is not a multiple of {record_size}")]
    MalformedIndexLength {
        /// Length of the rejected buffer
        length: usize,
        /// Expected record size
        record_size: usize,
    },

    /// The archive does not contain the tileset root entry at top level
    #[error("No root tileset found at top level: expected entry '{0}'")]
    MissingRootEntry(String),

    /// End-of-central-directory or central directory header could not be parsed
    #[error("Corrupt central directory: {reason}")]
    CorruptCentralDirectory {
        /// Detailed description of the defect
        reason: String,
    },

    /// Local file header signature or fields are invalid
    #[error("Corrupt local file header at offset {offset}: {reason}")]
    CorruptLocalHeader {
        /// Absolute archive offset of the local header
        offset: u64,
        /// Detailed description of the defect
        reason: String,
    },

    /// Output path exists and overwriting was not requested
    #[error("File {} already exists. Specify -f or --force to overwrite existing files.", .0.display())]
    OutputExists(PathBuf),

    /// Too many report entries were skipped because lines did not match
    #[error("Report ingestion drifted: {skipped} entries skipped (limit {limit})")]
    IngestionParseDrift {
        /// Number of skipped entries
        skipped: usize,
        /// Configured limit
        limit: usize,
    },

    /// Keys from the prior index are absent from the re-packed archive
    #[error("{missing} indexed entries are missing from the re-packed archive")]
    RepairKeyMissing {
        /// Number of prior keys without a current entry
        missing: usize,
    },

    /// Embedded index uses a compression method this crate cannot undo
    #[error("Unsupported compression method {0} for embedded index")]
    UnsupportedCompression(u16),

    /// Invalid record range for listing
    #[error("Invalid range: start {start} is past end {end}")]
    InvalidRange {
        /// Requested start position
        start: usize,
        /// Requested end position
        end: usize,
    },

    /// Binary read/write error
    #[error("Binary format error: {}", describe_decode_error(.0))]
    BinRead(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Create a central directory error
    pub fn central_directory(reason: impl Into<String>) -> Self {
        Self::CorruptCentralDirectory {
            reason: reason.into(),
        }
    }

    /// Create a local header error
    pub fn local_header(offset: u64, reason: impl Into<String>) -> Self {
        Self::CorruptLocalHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Check if this error indicates damaged archive or index bytes
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::MalformedIndexLength { .. }
                | Self::CorruptCentralDirectory { .. }
                | Self::CorruptLocalHeader { .. }
                | Self::BinRead(_)
        )
    }

    /// Check if this error was caused by caller input rather than file contents
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingRootEntry(_)
                | Self::OutputExists(_)
                | Self::InvalidRange { .. }
                | Self::IngestionParseDrift { .. }
        )
    }
}

/// Short plain-text reason for a record decoding failure
///
/// binrw's own `Display` carries a colored backtrace, which does not belong in
/// a one-line diagnostic.
pub(crate) fn describe_decode_error(error: &binrw::Error) -> String {
    match error.root_cause() {
        binrw::Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            "record is truncated".to_string()
        }
        binrw::Error::Io(io) => io.to_string(),
        binrw::Error::BadMagic { pos, .. } => format!("bad signature at record byte {pos}"),
        binrw::Error::AssertFail { pos, message } => format!("{message} at record byte {pos}"),
        _ => "malformed record".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::archive::CentralDirectoryHeader;
    use binrw::BinRead;
    use binrw::io::Cursor;

    #[test]
    fn test_output_exists_message_mentions_force() {
        let err = IndexError::OutputExists(PathBuf::from("out.idx"));
        let message = err.to_string();
        assert!(message.contains("out.idx"));
        assert!(message.contains("--force"));
    }

    #[test]
    fn test_error_classification() {
        assert!(IndexError::central_directory("truncated").is_corruption());
        assert!(IndexError::local_header(10, "bad signature").is_corruption());
        assert!(
            IndexError::MalformedIndexLength {
                length: 25,
                record_size: 24
            }
            .is_corruption()
        );
        assert!(IndexError::MissingRootEntry("tileset.json".into()).is_input_error());
        assert!(!IndexError::MissingRootEntry("tileset.json".into()).is_corruption());
    }

    #[test]
    fn test_decode_errors_render_as_one_plain_line() {
        let bad_magic = CentralDirectoryHeader::read_le(&mut Cursor::new([0u8; 64]))
            .expect_err("zeroes are not a header");
        let truncated = CentralDirectoryHeader::read_le(&mut Cursor::new(
            0x0201_4b50_u32.to_le_bytes(),
        ))
        .expect_err("signature alone is not a header");

        assert!(describe_decode_error(&bad_magic).starts_with("bad signature"));
        assert_eq!(describe_decode_error(&truncated), "record is truncated");

        let message = IndexError::from(truncated).to_string();
        assert_eq!(message, "Binary format error: record is truncated");
        assert!(!message.contains('\u{1b}'));
    }
}
