//! Zip record signatures and sizes

/// Local file header signature ("PK\x03\x04")
pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Central directory header signature ("PK\x01\x02")
pub const CENTRAL_DIRECTORY_HEADER_SIGNATURE: u32 = 0x0201_4b50;

/// End of central directory record signature ("PK\x05\x06")
pub const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

/// Zip64 end of central directory record signature ("PK\x06\x06")
pub const ZIP64_END_RECORD_SIGNATURE: u32 = 0x0606_4b50;

/// Zip64 end of central directory locator signature ("PK\x06\x07")
pub const ZIP64_END_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;

/// Extra field tag of the zip64 extended information block
pub const ZIP64_EXTRA_TAG: u16 = 0x0001;

/// 32-bit field value meaning "see the zip64 extra field"
pub const ZIP64_SENTINEL: u32 = 0xFFFF_FFFF;

/// 16-bit count or disk value meaning "see the zip64 record"
pub const ZIP64_SENTINEL_16: u16 = 0xFFFF;

/// Fixed part of the end of central directory record
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 22;

/// Fixed part of a central directory header
pub const CENTRAL_DIRECTORY_HEADER_SIZE: usize = 46;

/// Fixed part of a local file header
pub const LOCAL_FILE_HEADER_SIZE: usize = 30;

/// Zip64 end of central directory locator
pub const ZIP64_END_LOCATOR_SIZE: usize = 20;

/// Zip64 end of central directory record without extensible data
pub const ZIP64_END_RECORD_SIZE: usize = 56;

/// Largest value of any 16-bit length field
pub const MAX_VARIABLE_FIELD: usize = u16::MAX as usize;

/// Largest trailer that can follow the start of the last central directory header
///
/// Covers the last header with maximal name, extra field and comment, a zip64
/// record and locator, and an end record with a maximal comment.
pub const MAX_TRAILER_SIZE: usize = CENTRAL_DIRECTORY_HEADER_SIZE
    + 3 * MAX_VARIABLE_FIELD
    + ZIP64_END_RECORD_SIZE
    + ZIP64_END_LOCATOR_SIZE
    + END_OF_CENTRAL_DIRECTORY_SIZE
    + MAX_VARIABLE_FIELD;

/// Compression method: stored
pub const METHOD_STORED: u16 = 0;

/// Compression method: deflate
pub const METHOD_DEFLATED: u16 = 8;

/// Version needed to extract a plain entry (2.0)
pub const VERSION_DEFAULT: u16 = 20;

/// Version needed to extract an entry with zip64 fields (4.5)
pub const VERSION_ZIP64: u16 = 45;
