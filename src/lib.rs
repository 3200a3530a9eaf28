//! Container, LZX, and typed asset-graph reader for Magicka's packaged
//! content files.
//!
//! The crate is a one-way, synchronous pipeline: container header → LZX
//! payload decompression → type-reader registry → typed asset graph →
//! on-demand block-compressed texture decode. See [`reader::read_container`]
//! for the entry point.

pub mod asset;
pub mod bitstream;
pub mod container;
pub mod error;
pub mod lzx;
pub mod primitives;
pub mod reader;
pub mod registry;
pub mod texture;

pub use asset::{AssetGraph, AssetVariant};
pub use container::Header;
pub use error::ContentError;
pub use reader::{read_container, read_file, Container};
