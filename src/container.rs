//! Container header and frame-loop decompression (§4.5, §6).
//!
//! Grounded on `game_data::header::Header`'s `Decode` impl (magic check
//! followed by fixed fields), generalized here to the container's
//! conditionally-present `uncompressed_size` field and its frame-prefix loop.

use tracing::{debug, trace};

use crate::error::HeaderError;
use crate::lzx::LzxDecoder;
use crate::primitives::Reader;

const MAGIC: [u8; 3] = *b"XNB";
const HEADER_SIZE_COMPRESSED: usize = 14;
const HEADER_SIZE_UNCOMPRESSED: usize = 10;
const DEFAULT_FRAME_SIZE: usize = 0x8000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Windows,
    WindowsPhone,
    Xbox360,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    V31,
}

#[derive(Clone, Debug)]
pub struct Header {
    pub platform: Platform,
    pub version: Version,
    pub hi_def: bool,
    pub compressed: bool,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl Header {
    /// Size of the fixed on-disk header, in bytes.
    pub fn header_size(&self) -> usize {
        if self.compressed {
            HEADER_SIZE_COMPRESSED
        } else {
            HEADER_SIZE_UNCOMPRESSED
        }
    }
}

/// Parses the fixed container header (§4.5, §6). Only version v31 is
/// accepted; v40 is a recognized-but-rejected byte value (§9).
pub fn read_header(r: &mut Reader<'_>) -> Result<Header, HeaderError> {
    let mut magic = [0u8; 3];
    magic.copy_from_slice(r.bytes(3)?);
    if magic != MAGIC {
        return Err(HeaderError::NotAnContainerFile);
    }

    let platform = match r.u8()? {
        b'w' => Platform::Windows,
        b'm' => Platform::WindowsPhone,
        b'x' => Platform::Xbox360,
        other => return Err(HeaderError::UnknownPlatform(other)),
    };

    let version_byte = r.u8()?;
    let version = match version_byte {
        4 => Version::V31,
        5 => return Err(HeaderError::UnsupportedVersion(version_byte)),
        other => return Err(HeaderError::UnknownVersion(other)),
    };

    let flags = r.u8()?;
    let hi_def = flags & 0x01 != 0;
    let compressed = flags & 0x80 != 0;

    let compressed_size = r.u32_le()?;
    let uncompressed_size = if compressed {
        r.u32_le()?
    } else {
        compressed_size.saturating_sub(HEADER_SIZE_UNCOMPRESSED as u32)
    };

    debug!(
        ?platform,
        ?version,
        hi_def,
        compressed,
        compressed_size,
        uncompressed_size,
        "parsed container header"
    );

    Ok(Header {
        platform,
        version,
        hi_def,
        compressed,
        compressed_size,
        uncompressed_size,
    })
}

/// Drives the LZX decoder across the frame-prefixed payload until the
/// source is exhausted or a terminator frame is observed (§4.5, §6).
pub fn decompress_payload(payload: &[u8], uncompressed_size: usize) -> Result<Vec<u8>, crate::error::LzxError> {
    let mut out = Vec::with_capacity(uncompressed_size);
    let mut decoder = LzxDecoder::new();
    let mut pos = 0usize;

    while pos < payload.len() {
        let (frame_size, block_size, prefix_len) = read_frame_prefix(payload, pos)?;
        if frame_size == 0 || block_size == 0 {
            break;
        }
        let frame_start = pos + prefix_len;
        trace!(pos, frame_size, block_size, "decoding lzx frame");
        let next = decoder.decompress(payload, frame_start, block_size, &mut out, frame_size)?;
        pos = next;
    }

    Ok(out)
}

/// Reads the frame prefix at `pos`: `0xFF` flags an explicit `frame_size`,
/// otherwise the default frame size of `0x8000` applies (§6). Returns
/// `(frame_size, block_size, prefix_len)` where `prefix_len` is how many
/// bytes of `payload` the prefix itself occupied.
fn read_frame_prefix(payload: &[u8], pos: usize) -> Result<(usize, usize, usize), crate::error::LzxError> {
    let mut r = Reader::new(&payload[pos..]);
    let marker = r.u8().map_err(crate::error::LzxError::Read)?;
    if marker == 0xFF {
        let frame_size = r.u16_be().map_err(crate::error::LzxError::Read)? as usize;
        let block_size = r.u16_be().map_err(crate::error::LzxError::Read)? as usize;
        Ok((frame_size, block_size, r.position()))
    } else {
        let mut r = Reader::new(&payload[pos..]);
        let block_size = r.u16_be().map_err(crate::error::LzxError::Read)? as usize;
        Ok((DEFAULT_FRAME_SIZE, block_size, r.position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressed_header_bytes(compressed_size: u32, uncompressed_size: u32) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(b"XNB");
        v.push(b'w');
        v.push(4);
        v.push(0x80);
        v.extend_from_slice(&compressed_size.to_le_bytes());
        v.extend_from_slice(&uncompressed_size.to_le_bytes());
        v
    }

    #[test]
    fn parses_compressed_header() {
        let bytes = compressed_header_bytes(100, 200);
        let mut r = Reader::new(&bytes);
        let header = read_header(&mut r).unwrap();
        assert_eq!(header.platform, Platform::Windows);
        assert_eq!(header.version, Version::V31);
        assert!(header.compressed);
        assert!(!header.hi_def);
        assert_eq!(header.compressed_size, 100);
        assert_eq!(header.uncompressed_size, 200);
        assert_eq!(header.header_size(), 14);
    }

    #[test]
    fn parses_uncompressed_header() {
        let mut v = Vec::new();
        v.extend_from_slice(b"XNB");
        v.push(b'x');
        v.push(4);
        v.push(0x00);
        v.extend_from_slice(&50u32.to_le_bytes());
        let mut r = Reader::new(&v);
        let header = read_header(&mut r).unwrap();
        assert_eq!(header.platform, Platform::Xbox360);
        assert!(!header.compressed);
        assert_eq!(header.header_size(), 10);
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = [b'X', b'N', b'X', b'w', 4, 0, 0, 0, 0, 0];
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            read_header(&mut r),
            Err(HeaderError::NotAnContainerFile)
        ));
    }

    #[test]
    fn rejects_v40() {
        let mut v = Vec::new();
        v.extend_from_slice(b"XNB");
        v.push(b'w');
        v.push(5);
        v.push(0x00);
        v.extend_from_slice(&0u32.to_le_bytes());
        let mut r = Reader::new(&v);
        assert!(matches!(
            read_header(&mut r),
            Err(HeaderError::UnsupportedVersion(5))
        ));
    }

    #[test]
    fn terminator_frame_stops_the_loop() {
        let payload = [0x00u8, 0x00]; // default-frame-size prefix, block_size=0
        let out = decompress_payload(&payload, 0).unwrap();
        assert!(out.is_empty());
    }
}
