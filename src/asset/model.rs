//! `VertexDeclaration`/`Model`/`BiTreeModel`/`RenderDeferredEffect` records
//! (§3, §6).
//!
//! Grounded on `game_gltf::types::{GltfMesh, GltfNode}`'s mesh/bone/material
//! record shape and `game_data::record::Record`'s dispatch-then-read
//! pattern for cross-references into sibling asset slots.

use glam::{Mat4, Vec3};

use crate::asset::{read_asset_expecting, read_bone_ref};
use crate::error::AssetError;
use crate::primitives::Reader;
use crate::registry::{AssetKind, TypeReaderRegistry};

#[derive(Clone, Debug)]
pub struct VertexElement {
    pub stream: u16,
    pub offset: u16,
    pub format: u8,
    pub method: u8,
    pub usage: u8,
    pub usage_index: u8,
}

#[derive(Clone, Debug)]
pub struct VertexDeclaration {
    pub elements: Vec<VertexElement>,
}

pub fn read_vertex_declaration(r: &mut Reader<'_>) -> Result<VertexDeclaration, AssetError> {
    let num_elements = r.u32_le()?;
    let mut elements = Vec::with_capacity(num_elements as usize);
    for _ in 0..num_elements {
        elements.push(VertexElement {
            stream: r.u16_le()?,
            offset: r.u16_le()?,
            format: r.u8()?,
            method: r.u8()?,
            usage: r.u8()?,
            usage_index: r.u8()?,
        });
    }
    Ok(VertexDeclaration { elements })
}

#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    pub transform: Mat4,
    pub parent: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ModelMeshPart {
    pub stream_offset: u32,
    pub base_vertex: u32,
    pub vertex_count: u32,
    pub start_index: u32,
    pub primitive_count: u32,
    pub vertex_declaration: u32,
    pub effect: Box<super::AssetVariant>,
}

#[derive(Clone, Debug)]
pub struct ModelMesh {
    pub name: String,
    pub parent_bone: u32,
    pub bounding_sphere_center: Vec3,
    pub bounding_sphere_radius: f32,
    pub parts: Vec<ModelMeshPart>,
}

#[derive(Debug)]
pub struct Model {
    pub bones: Vec<Bone>,
    pub bone_hierarchy: Vec<Vec<u32>>,
    pub vertex_declarations: Vec<VertexDeclaration>,
    pub meshes: Vec<ModelMesh>,
    pub root_bone_ref: u32,
    pub tag: Option<String>,
}

pub fn read_model(r: &mut Reader<'_>, registry: &TypeReaderRegistry) -> Result<Model, AssetError> {
    let num_bones = r.read_7bit_encoded_i32()?.max(0) as usize;

    let mut bones = Vec::with_capacity(num_bones);
    for _ in 0..num_bones {
        let name = r.read_7bit_length_string()?;
        let transform = r.mat4x4()?;
        let has_parent = r.bool()?;
        let parent = if has_parent {
            Some(read_bone_ref(r, num_bones)?)
        } else {
            None
        };
        bones.push(Bone {
            name,
            transform,
            parent,
        });
    }

    let mut bone_hierarchy = Vec::with_capacity(num_bones);
    for _ in 0..num_bones {
        let child_count = r.read_7bit_encoded_i32()?.max(0) as usize;
        let mut children = Vec::with_capacity(child_count);
        for _ in 0..child_count {
            children.push(read_bone_ref(r, num_bones)?);
        }
        bone_hierarchy.push(children);
    }

    let num_declarations = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut vertex_declarations = Vec::with_capacity(num_declarations);
    for _ in 0..num_declarations {
        vertex_declarations.push(read_vertex_declaration(r)?);
    }

    let num_meshes = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut meshes = Vec::with_capacity(num_meshes);
    for _ in 0..num_meshes {
        let name = r.read_7bit_length_string()?;
        let parent_bone = read_bone_ref(r, num_bones)?;
        let bounding_sphere_center = r.vec3()?;
        let bounding_sphere_radius = r.f32_le()?;
        let num_parts = r.read_7bit_encoded_i32()?.max(0) as usize;
        let mut parts = Vec::with_capacity(num_parts);
        for _ in 0..num_parts {
            parts.push(ModelMeshPart {
                stream_offset: r.u32_le()?,
                base_vertex: r.u32_le()?,
                vertex_count: r.u32_le()?,
                start_index: r.u32_le()?,
                primitive_count: r.u32_le()?,
                vertex_declaration: r.read_7bit_encoded_i32()?.max(0) as u32,
                effect: Box::new(read_asset_expecting(
                    r,
                    registry,
                    AssetKind::RenderDeferredEffect,
                )?),
            });
        }
        meshes.push(ModelMesh {
            name,
            parent_bone,
            bounding_sphere_center,
            bounding_sphere_radius,
            parts,
        });
    }

    let root_bone_ref = read_bone_ref(r, num_bones)?;
    let has_tag = r.bool()?;
    let tag = if has_tag {
        Some(r.read_7bit_length_string()?)
    } else {
        None
    };

    Ok(Model {
        bones,
        bone_hierarchy,
        vertex_declarations,
        meshes,
        root_bone_ref,
        tag,
    })
}

#[derive(Clone, Copy, Debug)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

pub fn read_bounding_box(r: &mut Reader<'_>) -> Result<BoundingBox, AssetError> {
    Ok(BoundingBox {
        min: r.vec3()?,
        max: r.vec3()?,
    })
}

/// A node of the recursive collision/visibility tree (§3, §6): each node
/// exclusively owns 0, 1, or 2 children.
#[derive(Debug)]
pub struct BiTreeNode {
    pub primitive_count: i32,
    pub start_index: i32,
    pub bounds: BoundingBox,
    pub child_a: Option<Box<BiTreeNode>>,
    pub child_b: Option<Box<BiTreeNode>>,
}

fn read_bi_tree_node(r: &mut Reader<'_>) -> Result<BiTreeNode, AssetError> {
    let primitive_count = r.i32_le()?;
    let start_index = r.i32_le()?;
    let bounds = read_bounding_box(r)?;
    let has_child_a = r.bool()?;
    let child_a = if has_child_a {
        Some(Box::new(read_bi_tree_node(r)?))
    } else {
        None
    };
    let has_child_b = r.bool()?;
    let child_b = if has_child_b {
        Some(Box::new(read_bi_tree_node(r)?))
    } else {
        None
    };
    Ok(BiTreeNode {
        primitive_count,
        start_index,
        bounds,
        child_a,
        child_b,
    })
}

#[derive(Debug)]
pub struct BiTree {
    pub visibility: bool,
    pub cast_shadows: bool,
    pub sway: bool,
    pub entity_influence: bool,
    pub ground_level: f32,
    pub vertex_count: u32,
    pub vertex_stride: u32,
    pub vertex_declaration: Box<super::AssetVariant>,
    pub vertex_buffer: Box<super::AssetVariant>,
    pub index_buffer: Box<super::AssetVariant>,
    pub effect: Box<super::AssetVariant>,
    pub root_node: BiTreeNode,
}

#[derive(Debug)]
pub struct BiTreeModel {
    pub trees: Vec<BiTree>,
}

pub fn read_bi_tree_model(r: &mut Reader<'_>, registry: &TypeReaderRegistry) -> Result<BiTreeModel, AssetError> {
    let num_trees = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut trees = Vec::with_capacity(num_trees);
    for _ in 0..num_trees {
        trees.push(BiTree {
            visibility: r.bool()?,
            cast_shadows: r.bool()?,
            sway: r.bool()?,
            entity_influence: r.bool()?,
            ground_level: r.f32_le()?,
            vertex_count: r.u32_le()?,
            vertex_stride: r.u32_le()?,
            vertex_declaration: Box::new(read_asset_expecting(
                r,
                registry,
                AssetKind::VertexDeclaration,
            )?),
            vertex_buffer: Box::new(read_asset_expecting(r, registry, AssetKind::VertexBuffer)?),
            index_buffer: Box::new(read_asset_expecting(r, registry, AssetKind::IndexBuffer)?),
            effect: Box::new(read_asset_expecting(
                r,
                registry,
                AssetKind::RenderDeferredEffect,
            )?),
            root_node: read_bi_tree_node(r)?,
        });
    }
    Ok(BiTreeModel { trees })
}

#[derive(Clone, Debug)]
pub struct Material {
    pub diffuse_color: Vec3,
    pub emissive_color: Vec3,
    pub specular_color: Vec3,
    pub specular_power: f32,
    pub diffuse_map: Option<String>,
    pub normal_map: Option<String>,
    pub specular_map: Option<String>,
}

fn read_optional_string(r: &mut Reader<'_>) -> Result<Option<String>, AssetError> {
    if r.bool()? {
        Ok(Some(r.read_7bit_length_string()?))
    } else {
        Ok(None)
    }
}

fn read_material(r: &mut Reader<'_>) -> Result<Material, AssetError> {
    Ok(Material {
        diffuse_color: r.vec3()?,
        emissive_color: r.vec3()?,
        specular_color: r.vec3()?,
        specular_power: r.f32_le()?,
        diffuse_map: read_optional_string(r)?,
        normal_map: read_optional_string(r)?,
        specular_map: read_optional_string(r)?,
    })
}

#[derive(Debug)]
pub struct RenderDeferredEffect {
    pub alpha: f32,
    pub sharpness: f32,
    pub vertex_color_enabled: bool,
    pub reflectiveness_from_material: bool,
    pub reflection_map_name: String,
    pub material_0: Material,
    pub material_1: Option<Material>,
}

pub fn read_render_deferred_effect(r: &mut Reader<'_>) -> Result<RenderDeferredEffect, AssetError> {
    let alpha = r.f32_le()?;
    let sharpness = r.f32_le()?;
    let vertex_color_enabled = r.bool()?;
    let reflectiveness_from_material = r.bool()?;
    let reflection_map_name = r.read_7bit_length_string()?;
    let material_0 = read_material(r)?;
    let has_material_1 = r.bool()?;
    let material_1 = if has_material_1 {
        Some(read_material(r)?)
    } else {
        None
    };
    Ok(RenderDeferredEffect {
        alpha,
        sharpness,
        vertex_color_enabled,
        reflectiveness_from_material,
        reflection_map_name,
        material_0,
        material_1,
    })
}
