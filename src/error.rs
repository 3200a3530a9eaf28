use thiserror::Error;

/// Every primitive read failure carries enough context to tell a caller
/// where in the stream it happened and what was being decoded.
///
/// Mirrors `game_data::EofError`'s `{on, consumed, expected}` shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unexpected end of stream reading {what}: needed {needed} byte(s) at offset {at}, only {available} available")]
pub struct UnexpectedEof {
    pub what: &'static str,
    pub at: usize,
    pub needed: usize,
    pub available: usize,
}

/// A 7-bit-encoded varint that never terminated within 5 bytes (§4.1).
///
/// Mirrors `game_data::varint::VarIntError`'s `{Byte, Overflow}` shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum VarintError {
    #[error(transparent)]
    Eof(#[from] UnexpectedEof),
    #[error("7-bit varint did not terminate within 5 bytes")]
    Overflow,
}

/// A 7-bit-length-prefixed UTF-8 string failed to decode (§4.1).
#[derive(Debug, Error)]
pub enum StringError {
    #[error("failed to decode string length: {0}")]
    Length(#[from] VarintError),
    #[error("failed to decode string bytes: {0}")]
    Bytes(#[from] UnexpectedEof),
    #[error("invalid utf8 in length-prefixed string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Failures from the container header / frame prefix (§4.5, §6).
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("not an XNB container file (bad magic)")]
    NotAnContainerFile,
    #[error("unknown platform byte {0:#04x}")]
    UnknownPlatform(u8),
    #[error("unknown version byte {0}")]
    UnknownVersion(u8),
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u8),
    #[error(transparent)]
    Read(#[from] UnexpectedEof),
}

/// Failures from the LZX window decompressor (§4.3).
#[derive(Debug, Error)]
pub enum LzxError {
    #[error("block type {0} is invalid")]
    InvalidBlock(u8),
    #[error("source advanced past the expected end of the current run")]
    BufferOverrun,
    #[error("failed to decode a huffman symbol (table position ran off the end)")]
    ReadHuffSymFailed,
    #[error("huffman table overrun while constructing a decode entry")]
    TableOverrun,
    #[error("huffman table is erroneous: code lengths do not form a valid tree")]
    ErroneousTable,
    #[error("window size {0} is invalid")]
    InvalidWindowSize(u32),
    #[error("input data too small: needed {needed}, got {got}")]
    InputDataTooSmall { needed: usize, got: usize },
    #[error("output buffer too small: needed {needed}, got {got}")]
    OutputDataTooSmall { needed: usize, got: usize },
    #[error("internal invariant violated: {0}")]
    SomethingBad(&'static str),
    #[error(transparent)]
    Read(#[from] UnexpectedEof),
}

/// Failures decoding the type-reader registry or asset graph (§4.6, §3).
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("type reader {0:?} is not implemented")]
    Unimplemented(String),
    #[error("unexpected asset type: expected {expected}, found {found}")]
    UnexpectedAssetType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("asset type id {id} out of range (have {count} type readers)")]
    TypeIdOutOfRange { id: u32, count: usize },
    #[error("collision material byte {0} is out of range")]
    InvalidCollisionMaterial(u8),
    #[error(transparent)]
    Read(#[from] UnexpectedEof),
    #[error(transparent)]
    Varint(#[from] VarintError),
    #[error(transparent)]
    String(#[from] StringError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Failures decoding a texture mip's pixel payload (§4.4, §4.8).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("unsupported texture pixel format {0}")]
    UnsupportedTextureFormat(u32),
    #[error("block input too small: needed {needed}, got {got}")]
    InputDataTooSmall { needed: usize, got: usize },
    #[error("pixel output buffer too small: needed {needed}, got {got}")]
    OutputDataTooSmall { needed: usize, got: usize },
    #[error("mip index {index} out of range (have {count})")]
    MipIndexOutOfRange { index: usize, count: usize },
}

/// The single error type returned at the crate boundary.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Lzx(#[from] LzxError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
