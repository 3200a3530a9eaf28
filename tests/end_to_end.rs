//! End-to-end scenarios from spec §8: container header happy paths, the
//! type-reader-mapping parse, and a full container → LZX → asset-graph
//! round trip through the public API.

use magicka_content::asset::texture::PixelFormat;
use magicka_content::asset::{read_asset_graph, AssetVariant};
use magicka_content::container::{read_header, Platform, Version};
use magicka_content::error::HeaderError;
use magicka_content::primitives::Reader;
use magicka_content::{read_container, ContentError};

#[test]
fn header_happy_path_uncompressed() {
    // §8 scenario 1.
    let bytes = [
        0x58, 0x4E, 0x42, 0x77, 0x04, 0x00, 0x0A, 0x00, 0x00, 0x00,
    ];
    let mut r = Reader::new(&bytes);
    let header = read_header(&mut r).unwrap();
    assert_eq!(header.platform, Platform::Windows);
    assert_eq!(header.version, Version::V31);
    assert!(!header.hi_def);
    assert!(!header.compressed);
    assert_eq!(header.compressed_size, 10);
    assert_eq!(header.uncompressed_size, 0);
}

#[test]
fn header_happy_path_compressed() {
    // §8 scenario 2.
    let bytes = [
        0x58, 0x4E, 0x42, 0x77, 0x04, 0x81, 0x1C, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00,
    ];
    let mut r = Reader::new(&bytes);
    let header = read_header(&mut r).unwrap();
    assert_eq!(header.platform, Platform::Windows);
    assert_eq!(header.version, Version::V31);
    assert!(header.hi_def);
    assert!(header.compressed);
    assert_eq!(header.compressed_size, 28);
    assert_eq!(header.uncompressed_size, 4096);
    assert_eq!(header.compressed_size as usize - header.header_size(), 14);
}

#[test]
fn header_rejects_wrong_magic() {
    // §8 scenario 3.
    let bytes = [0x41, 0x42, 0x43, 0x77, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];
    let mut r = Reader::new(&bytes);
    assert!(matches!(
        read_header(&mut r),
        Err(HeaderError::NotAnContainerFile)
    ));
}

/// Builds a minimal decompressed asset-graph payload declaring a single
/// `Texture2DReader` type-reader and a zero-mip, zero-size primary
/// `Texture2D` asset (§8 scenario 7).
fn texture2d_asset_graph_payload() -> Vec<u8> {
    let mut v = Vec::new();
    v.push(1); // type_reader_count = 1
    let name = b"Microsoft.Xna.Framework.Content.Texture2DReader";
    v.push(name.len() as u8); // 7-bit length fits in one byte
    v.extend_from_slice(name);
    v.extend_from_slice(&0i32.to_le_bytes()); // version
    v.push(0); // shared_asset_count = 0
    v.push(1); // primary type-id = 1 (first and only type-reader)
    v.extend_from_slice(&0u32.to_le_bytes()); // format = color
    v.extend_from_slice(&0u32.to_le_bytes()); // width
    v.extend_from_slice(&0u32.to_le_bytes()); // height
    v.extend_from_slice(&0u32.to_le_bytes()); // mip_count = 0
    v
}

#[test]
fn type_reader_mapping_resolves_texture_2d() {
    let payload = texture2d_asset_graph_payload();
    let mut r = Reader::new(&payload);
    let graph = read_asset_graph(&mut r).unwrap();
    assert_eq!(graph.type_readers.len(), 1);
    match graph.primary {
        AssetVariant::Texture2D(tex) => {
            assert_eq!(tex.format, PixelFormat::Color);
            assert_eq!(tex.width, 0);
            assert_eq!(tex.height, 0);
            assert!(tex.mips.is_empty());
        }
        other => panic!("expected Texture2D, got {:?}", other),
    }
}

/// Packs `payload` as a single LZX "uncompressed" block (kind 3) wrapped in
/// one explicit-size frame prefix, driving the real bit-level control flow
/// (intel flag, 3-bit block kind, 24-bit block length, realignment) rather
/// than asserting against a pre-decoded buffer.
///
/// Returns the payload-section bytes (frame prefix + block) and the total
/// number of source bytes the block occupies.
fn pack_uncompressed_frame(payload: &[u8]) -> Vec<u8> {
    let block_length = payload.len() as u32;
    let hi = (block_length >> 8) & 0xFFFF;
    let lo = block_length & 0xFF;

    // 28 header bits (intel=0, kind=3, hi, lo), MSB-first, padded to the
    // next 16-bit group boundary (always 4 padding bits, since 28 < 32).
    let mut acc: u32 = 0;
    let mut push = |v: u32, n: u32| {
        acc = (acc << n) | (v & ((1u64 << n) as u32 - 1));
    };
    push(0, 1);
    push(3, 3);
    push(hi, 16);
    push(lo, 8);
    push(0, 4);
    let group_a = (acc >> 16) as u16;
    let group_b = (acc & 0xFFFF) as u16;

    let mut block = Vec::new();
    block.extend_from_slice(&group_a.to_le_bytes());
    block.extend_from_slice(&group_b.to_le_bytes());
    // r0, r1, r2 (unused by a pure literal-copy block).
    block.extend_from_slice(&1u32.to_le_bytes());
    block.extend_from_slice(&1u32.to_le_bytes());
    block.extend_from_slice(&1u32.to_le_bytes());
    block.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        block.push(0); // odd-length realignment pad (§4.3)
    }

    let frame_size = payload.len() as u16;
    let block_size = block.len() as u16;
    let mut framed = Vec::new();
    framed.push(0xFF);
    framed.extend_from_slice(&frame_size.to_be_bytes());
    framed.extend_from_slice(&block_size.to_be_bytes());
    framed.extend_from_slice(&block);
    framed
}

#[test]
fn full_container_round_trip_through_lzx() {
    let asset_payload = texture2d_asset_graph_payload();
    let framed = pack_uncompressed_frame(&asset_payload);

    let header_size = 14usize;
    let compressed_size = (header_size + framed.len()) as u32;
    let uncompressed_size = asset_payload.len() as u32;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"XNB");
    bytes.push(b'w');
    bytes.push(4);
    bytes.push(0x80); // compressed, not hi-def
    bytes.extend_from_slice(&compressed_size.to_le_bytes());
    bytes.extend_from_slice(&uncompressed_size.to_le_bytes());
    bytes.extend_from_slice(&framed);

    let container = read_container(&bytes).unwrap();
    assert!(container.header.compressed);
    assert_eq!(container.header.uncompressed_size, uncompressed_size);
    match container.assets.primary {
        AssetVariant::Texture2D(ref tex) => {
            assert_eq!(tex.width, 0);
            assert_eq!(tex.height, 0);
            assert!(tex.mips.is_empty());
        }
        ref other => panic!("expected Texture2D, got {:?}", other),
    }
}

#[test]
fn default_frame_size_is_0x8000_without_marker_byte() {
    // §8 boundary: a frame prefix with no `0xFF` marker uses the default
    // frame size of 0x8000, and a terminator (block_size == 0) ends the
    // stream immediately.
    let payload = [0x00u8, 0x00]; // block_size = 0 (big-endian u16)
    let decoded = magicka_content::container::decompress_payload(&payload, 0).unwrap();
    assert!(decoded.is_empty());
}

#[test]
fn truncated_container_is_an_error() {
    let bytes = [0x58, 0x4E, 0x42];
    assert!(matches!(
        read_container(&bytes),
        Err(ContentError::Header(_))
    ));
}
