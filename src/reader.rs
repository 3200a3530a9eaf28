//! Synchronous top-level orchestration (§5): header → payload
//! decompression → asset-graph read, on one container per call.
//!
//! Grounded on `game_data::loader::file::FileLoader::load`'s shape —
//! read the whole file, log at entry/exit, return a typed error — but
//! de-asynced per §5 (no cooperative suspension anywhere in this crate), so
//! `std::fs`/`std::io::Read` replace the teacher's `tokio::fs`.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::asset::AssetGraph;
use crate::container::{self, Header};
use crate::error::ContentError;
use crate::primitives::Reader;

/// A fully-decoded container: its header plus the decoded asset graph.
#[derive(Debug)]
pub struct Container {
    pub header: Header,
    pub assets: AssetGraph,
}

/// Reads and decodes a container file from disk.
pub fn read_file(path: &Path) -> Result<Container, ContentError> {
    info!(path = %path.display(), "reading container file");
    let bytes = fs::read(path)?;
    read_container(&bytes)
}

/// Reads and decodes a container already held in memory (§5: single
/// owner, single pass, no shared state across calls).
pub fn read_container(bytes: &[u8]) -> Result<Container, ContentError> {
    let mut r = Reader::new(bytes);
    let header = container::read_header(&mut r)?;

    let payload_start = header.header_size();
    let payload_len = (header.compressed_size as usize).saturating_sub(payload_start);
    let payload_end = (payload_start + payload_len).min(bytes.len());
    let payload = &bytes[payload_start..payload_end];

    let decoded = if header.compressed {
        container::decompress_payload(payload, header.uncompressed_size as usize)?
    } else {
        payload.to_vec()
    };
    info!(decoded_len = decoded.len(), "decompressed container payload");

    let mut asset_reader = Reader::new(&decoded);
    let assets = crate::asset::read_asset_graph(&mut asset_reader)?;
    info!(kind = assets.primary.kind_label(), "read primary asset");

    Ok(Container { header, assets })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_truncated_header() {
        let bytes = [b'X', b'N'];
        assert!(read_container(&bytes).is_err());
    }

    #[test]
    fn reads_uncompressed_container_with_no_type_readers() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"XNB");
        bytes.push(b'w');
        bytes.push(4);
        bytes.push(0x00); // uncompressed, not hi-def
        // payload: type_reader_count=0, shared_asset_count=0, primary type-id=0 (None)
        let payload = [0u8, 0, 0];
        let compressed_size = (10 + payload.len()) as u32;
        bytes.extend_from_slice(&compressed_size.to_le_bytes());
        bytes.extend_from_slice(&payload);

        let container = read_container(&bytes).unwrap();
        assert!(!container.header.compressed);
        assert!(container.assets.type_readers.is_empty());
        assert_eq!(container.assets.primary.kind_label(), "none");
    }
}
