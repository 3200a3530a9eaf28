//! Type-reader name table and asset-kind mapping (§4.6).
//!
//! Generalizes `game_data::record::{RecordKind, RecordKindError}`'s
//! fixed-enum dispatch to a runtime, data-driven registry: the file itself
//! declares which type-reader names are in play and in what order, and the
//! 7-bit varint type-IDs asset nodes carry index into that declared list.

use crate::error::AssetError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    String,
    Texture2D,
    Texture3D,
    Model,
    VertexDeclaration,
    VertexBuffer,
    IndexBuffer,
    List,
    BiTreeModel,
    RenderDeferredEffect,
    LevelModel,
}

impl AssetKind {
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::String => "string",
            AssetKind::Texture2D => "texture_2d",
            AssetKind::Texture3D => "texture_3d",
            AssetKind::Model => "model",
            AssetKind::VertexDeclaration => "vertex_declaration",
            AssetKind::VertexBuffer => "vertex_buffer",
            AssetKind::IndexBuffer => "index_buffer",
            AssetKind::List => "list",
            AssetKind::BiTreeModel => "bi_tree_model",
            AssetKind::RenderDeferredEffect => "render_deferred_effect",
            AssetKind::LevelModel => "level_model",
        }
    }
}

/// Exact-prefix-matched type-reader names recognized by this crate (§4.6).
/// Names in the file may carry an assembly-qualified suffix after a comma;
/// only the part before the first comma is matched here.
const RECOGNIZED: &[(&str, AssetKind)] = &[
    (
        "Microsoft.Xna.Framework.Content.StringReader",
        AssetKind::String,
    ),
    (
        "Microsoft.Xna.Framework.Content.Texture2DReader",
        AssetKind::Texture2D,
    ),
    (
        "Microsoft.Xna.Framework.Content.Texture3DReader",
        AssetKind::Texture3D,
    ),
    (
        "Microsoft.Xna.Framework.Content.ModelReader",
        AssetKind::Model,
    ),
    (
        "Microsoft.Xna.Framework.Content.VertexDeclarationReader",
        AssetKind::VertexDeclaration,
    ),
    (
        "Microsoft.Xna.Framework.Content.VertexBufferReader",
        AssetKind::VertexBuffer,
    ),
    (
        "Microsoft.Xna.Framework.Content.IndexBufferReader",
        AssetKind::IndexBuffer,
    ),
    (
        "Microsoft.Xna.Framework.Content.ListReader",
        AssetKind::List,
    ),
    (
        "PolygonHead.Pipeline.BiTreeModelReader",
        AssetKind::BiTreeModel,
    ),
    (
        "PolygonHead.Pipeline.RenderDeferredEffectReader",
        AssetKind::RenderDeferredEffect,
    ),
    (
        "Magicka.ContentReaders.LevelModelReader",
        AssetKind::LevelModel,
    ),
];

/// One declared type-reader entry: `{ name, version }` (§6).
#[derive(Clone, Debug)]
pub struct TypeReaderEntry {
    pub name: String,
    pub version: i32,
    pub kind: Option<AssetKind>,
}

/// The declared type-reader array read from the start of the asset graph.
#[derive(Clone, Debug, Default)]
pub struct TypeReaderRegistry {
    entries: Vec<TypeReaderEntry>,
}

impl TypeReaderRegistry {
    pub fn new(entries: Vec<(String, i32)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(name, version)| {
                let prefix = name.split(',').next().unwrap_or(&name).trim();
                let kind = RECOGNIZED
                    .iter()
                    .find(|(recognized, _)| *recognized == prefix)
                    .map(|(_, kind)| *kind);
                TypeReaderEntry { name, version, kind }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a 1-based type-ID (as carried by an asset node) to its
    /// asset kind. ID 0 is `None` and is handled by the caller before this
    /// is invoked.
    pub fn resolve(&self, type_id: u32) -> Result<AssetKind, AssetError> {
        let index = (type_id - 1) as usize;
        let entry = self
            .entries
            .get(index)
            .ok_or(AssetError::TypeIdOutOfRange {
                id: type_id,
                count: self.entries.len(),
            })?;
        entry
            .kind
            .ok_or_else(|| AssetError::Unimplemented(entry.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_recognized_prefix_with_assembly_suffix() {
        let registry = TypeReaderRegistry::new(vec![(
            "Microsoft.Xna.Framework.Content.Texture2DReader, Microsoft.Xna.Framework".to_owned(),
            0,
        )]);
        assert_eq!(registry.resolve(1).unwrap(), AssetKind::Texture2D);
    }

    #[test]
    fn unknown_name_is_unimplemented() {
        let registry = TypeReaderRegistry::new(vec![("Some.Unknown.Reader".to_owned(), 0)]);
        assert!(matches!(
            registry.resolve(1),
            Err(AssetError::Unimplemented(_))
        ));
    }

    #[test]
    fn out_of_range_id_is_rejected() {
        let registry = TypeReaderRegistry::new(vec![]);
        assert!(matches!(
            registry.resolve(1),
            Err(AssetError::TypeIdOutOfRange { id: 1, count: 0 })
        ));
    }
}
