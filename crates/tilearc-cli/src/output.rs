//! Result printing for the CLI
//!
//! Results go to stdout in the selected format; diagnostics go through
//! `tracing` to stderr.

use crate::OutputFormat;
use anyhow::Result;
use serde::Serialize;
use tilearc_index::index::IndexRecord;

/// Print `value` as JSON, or the text produced by `text` in text mode
pub fn emit<T, F>(format: OutputFormat, value: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Text => {
            let rendered = text(value);
            if !rendered.is_empty() {
                println!("{rendered}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// One listed record with its position
#[derive(Debug, Clone, Serialize)]
pub struct ListedRecord {
    /// Position in the index
    pub position: usize,
    /// Key as lowercase hex
    pub key: String,
    /// Low 64-bit key half
    pub low: u64,
    /// High 64-bit key half
    pub high: u64,
    /// Local header offset
    pub offset: u64,
}

impl ListedRecord {
    /// Describe the record at `position`
    pub fn new(position: usize, record: &IndexRecord) -> Self {
        Self {
            position,
            key: record.key.to_hex(),
            low: record.key.low(),
            high: record.key.high(),
            offset: record.offset,
        }
    }
}

/// Text line for a listed record: `i: low high (hex offset: n)`
pub fn format_record(record: &ListedRecord) -> String {
    format!(
        "{}: {} {} ({} offset: {})",
        record.position, record.low, record.high, record.key, record.offset
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilearc_index::PathKey;

    #[test]
    fn test_format_record() {
        let key = PathKey::from_bytes([1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
        let listed = ListedRecord::new(3, &IndexRecord::new(key, 77));
        assert_eq!(
            format_record(&listed),
            "3: 1 2 (01000000000000000200000000000000 offset: 77)"
        );
    }
}
