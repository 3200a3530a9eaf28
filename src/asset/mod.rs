//! Tagged asset-variant union and recursive dispatch (§3, §4.6).
//!
//! Grounded on `game_data::record::{Record, RecordBody}`: there, a fixed
//! `RecordKind` byte selects which `RecordBody` variant to decode next; here
//! the selector is a runtime, file-declared [`TypeReaderRegistry`] entry
//! instead of a compile-time enum, since the asset-graph's type registry is
//! itself data in the file (§4.6).

pub mod level;
pub mod model;
pub mod texture;

use indexmap::IndexMap;
use tracing::trace;

use crate::asset::level::LevelModel;
use crate::asset::model::{BiTreeModel, Model, RenderDeferredEffect, VertexDeclaration};
use crate::asset::texture::{Texture2D, Texture3D};
use crate::error::AssetError;
use crate::primitives::Reader;
use crate::registry::{AssetKind, TypeReaderRegistry};

/// The tagged union of every record type the asset graph can contain (§3).
#[derive(Debug)]
pub enum AssetVariant {
    None,
    String(String),
    Texture2D(Texture2D),
    Texture3D(Texture3D),
    VertexDeclaration(VertexDeclaration),
    VertexBuffer(Vec<u8>),
    IndexBuffer { is_16_bit: bool, bytes: Vec<u8> },
    Model(Model),
    BiTreeModel(BiTreeModel),
    RenderDeferredEffect(RenderDeferredEffect),
    LevelModel(LevelModel),
}

impl AssetVariant {
    pub fn kind_label(&self) -> &'static str {
        match self {
            AssetVariant::None => "none",
            AssetVariant::String(_) => "string",
            AssetVariant::Texture2D(_) => "texture_2d",
            AssetVariant::Texture3D(_) => "texture_3d",
            AssetVariant::VertexDeclaration(_) => "vertex_declaration",
            AssetVariant::VertexBuffer(_) => "vertex_buffer",
            AssetVariant::IndexBuffer { .. } => "index_buffer",
            AssetVariant::Model(_) => "model",
            AssetVariant::BiTreeModel(_) => "bi_tree_model",
            AssetVariant::RenderDeferredEffect(_) => "render_deferred_effect",
            AssetVariant::LevelModel(_) => "level_model",
        }
    }
}

/// The fully-decoded asset graph: the declared type-reader table plus the
/// primary asset (§6: "...then the primary asset").
#[derive(Debug)]
pub struct AssetGraph {
    pub type_readers: TypeReaderRegistry,
    pub primary: AssetVariant,
}

/// Reads the type-reader table, shared-asset list, and primary asset from
/// the start of a decompressed payload (§4.6, §6).
pub fn read_asset_graph(r: &mut Reader<'_>) -> Result<AssetGraph, AssetError> {
    let type_reader_count = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut entries = Vec::with_capacity(type_reader_count);
    for _ in 0..type_reader_count {
        let name = r.read_7bit_length_string()?;
        let version = r.i32_le()?;
        entries.push((name, version));
    }
    let registry = TypeReaderRegistry::new(entries);
    trace!(count = registry.len(), "read type-reader table");

    // Shared assets (§9): declared count is read and each one decoded
    // identically to the primary asset, then discarded, to keep the byte
    // stream synchronized.
    let shared_asset_count = r.read_7bit_encoded_i32()?.max(0) as usize;
    for _ in 0..shared_asset_count {
        let _ = read_asset(r, &registry)?;
    }

    let primary = read_asset(r, &registry)?;

    Ok(AssetGraph {
        type_readers: registry,
        primary,
    })
}

/// Reads one asset node: a 7-bit type-ID followed by the variant's wire
/// payload (§4.6).
pub fn read_asset(r: &mut Reader<'_>, registry: &TypeReaderRegistry) -> Result<AssetVariant, AssetError> {
    let type_id = r.read_7bit_encoded_i32()?;
    if type_id == 0 {
        return Ok(AssetVariant::None);
    }
    let kind = registry.resolve(type_id as u32)?;
    read_variant(r, registry, kind)
}

/// Reads an asset node whose kind is already known (used where a parent
/// record declares the expected child kind, e.g. a `VertexBuffer` field).
/// A type-ID of 0 (`None`) is also accepted here.
pub fn read_asset_expecting(
    r: &mut Reader<'_>,
    registry: &TypeReaderRegistry,
    expected: AssetKind,
) -> Result<AssetVariant, AssetError> {
    let type_id = r.read_7bit_encoded_i32()?;
    if type_id == 0 {
        return Ok(AssetVariant::None);
    }
    let kind = registry.resolve(type_id as u32)?;
    if kind != expected {
        return Err(AssetError::UnexpectedAssetType {
            expected: expected.label(),
            found: kind.label(),
        });
    }
    read_variant(r, registry, kind)
}

fn read_variant(
    r: &mut Reader<'_>,
    registry: &TypeReaderRegistry,
    kind: AssetKind,
) -> Result<AssetVariant, AssetError> {
    match kind {
        AssetKind::String => Ok(AssetVariant::String(r.read_7bit_length_string()?)),
        AssetKind::Texture2D => Ok(AssetVariant::Texture2D(texture::read_texture_2d(r)?)),
        AssetKind::Texture3D => Ok(AssetVariant::Texture3D(texture::read_texture_3d(r)?)),
        AssetKind::VertexDeclaration => Ok(AssetVariant::VertexDeclaration(
            model::read_vertex_declaration(r)?,
        )),
        AssetKind::VertexBuffer => {
            let size = r.u32_le()? as usize;
            Ok(AssetVariant::VertexBuffer(r.bytes(size)?.to_vec()))
        }
        AssetKind::IndexBuffer => {
            let is_16_bit = r.bool()?;
            let size = r.u32_le()? as usize;
            Ok(AssetVariant::IndexBuffer {
                is_16_bit,
                bytes: r.bytes(size)?.to_vec(),
            })
        }
        AssetKind::Model => Ok(AssetVariant::Model(model::read_model(r, registry)?)),
        AssetKind::BiTreeModel => Ok(AssetVariant::BiTreeModel(model::read_bi_tree_model(
            r, registry,
        )?)),
        AssetKind::RenderDeferredEffect => Ok(AssetVariant::RenderDeferredEffect(
            model::read_render_deferred_effect(r)?,
        )),
        AssetKind::LevelModel => Ok(AssetVariant::LevelModel(level::read_level_model(
            r, registry,
        )?)),
        AssetKind::List => Err(AssetError::Unimplemented(
            "list reader has no implicit element type at this call site".to_owned(),
        )),
    }
}

/// A reference to a bone by index: `u8` if the owning model has ≤255
/// bones, else `u32` LE (§6).
pub fn read_bone_ref(r: &mut Reader<'_>, num_bones: usize) -> Result<u32, AssetError> {
    if num_bones <= 255 {
        Ok(u32::from(r.u8()?))
    } else {
        Ok(r.u32_le()?)
    }
}

/// A keyed-by-name map with duplicate-replace semantics and stable
/// iteration order (§9).
pub type NamedMap<T> = IndexMap<String, T>;
