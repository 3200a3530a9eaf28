//! `LevelModel` and its substructures (§3 expansion).
//!
//! Follows the same `Record`-dispatch pattern as `asset::model`;
//! keyed-by-name collections use `IndexMap` per §9's "duplicate-replace,
//! stable iteration" guidance.

use glam::{Quat, Vec3};

use crate::asset::model::{read_bounding_box, Bone, BoundingBox};
use crate::asset::{read_asset_expecting, read_bone_ref, NamedMap};
use crate::error::AssetError;
use crate::primitives::Reader;
use crate::registry::{AssetKind, TypeReaderRegistry};

#[derive(Clone, Copy, Debug)]
pub struct Keyframe {
    pub time: f32,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

#[derive(Debug)]
pub struct AnimationTrack {
    pub bone: u32,
    pub keyframes: Vec<Keyframe>,
}

#[derive(Debug)]
pub struct AnimatedLevelPart {
    pub name: String,
    pub bi_tree_model: Box<super::AssetVariant>,
    pub bones: Vec<Bone>,
    pub animation_tracks: Vec<AnimationTrack>,
}

fn read_animated_level_part(
    r: &mut Reader<'_>,
    registry: &TypeReaderRegistry,
) -> Result<AnimatedLevelPart, AssetError> {
    let name = r.read_7bit_length_string()?;
    let bi_tree_model = Box::new(read_asset_expecting(r, registry, AssetKind::BiTreeModel)?);

    let num_bones = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut bones = Vec::with_capacity(num_bones);
    for _ in 0..num_bones {
        let bone_name = r.read_7bit_length_string()?;
        let transform = r.mat4x4()?;
        let has_parent = r.bool()?;
        let parent = if has_parent {
            Some(read_bone_ref(r, num_bones)?)
        } else {
            None
        };
        bones.push(Bone {
            name: bone_name,
            transform,
            parent,
        });
    }

    let num_tracks = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut animation_tracks = Vec::with_capacity(num_tracks);
    for _ in 0..num_tracks {
        let bone = read_bone_ref(r, num_bones)?;
        let num_keyframes = r.read_7bit_encoded_i32()?.max(0) as usize;
        let mut keyframes = Vec::with_capacity(num_keyframes);
        for _ in 0..num_keyframes {
            keyframes.push(Keyframe {
                time: r.f32_le()?,
                translation: r.vec3()?,
                rotation: r.quat()?,
                scale: r.vec3()?,
            });
        }
        animation_tracks.push(AnimationTrack { bone, keyframes });
    }

    Ok(AnimatedLevelPart {
        name,
        bi_tree_model,
        bones,
        animation_tracks,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Point,
    Directional,
    Spot,
}

#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub range: f32,
    pub intensity: f32,
}

fn read_light(r: &mut Reader<'_>) -> Result<Light, AssetError> {
    let kind_byte = r.u8()?;
    let kind = match kind_byte {
        0 => LightKind::Point,
        1 => LightKind::Directional,
        2 => LightKind::Spot,
        other => return Err(AssetError::InvalidCollisionMaterial(other)),
    };
    Ok(Light {
        kind,
        position: r.vec3()?,
        direction: r.vec3()?,
        color: r.vec3()?,
        range: r.f32_le()?,
        intensity: r.f32_le()?,
    })
}

/// An opaque, named, declared-length blob whose internal fields are not
/// interpreted by this crate (§3 expansion): consumed only to keep the byte
/// stream synchronized.
#[derive(Clone, Debug)]
pub struct NamedBlob {
    pub name: String,
    pub payload: Vec<u8>,
}

fn read_named_blob(r: &mut Reader<'_>) -> Result<NamedBlob, AssetError> {
    let name = r.read_7bit_length_string()?;
    let size = r.u32_le()? as usize;
    Ok(NamedBlob {
        name,
        payload: r.bytes(size)?.to_vec(),
    })
}

/// One of ten named collision-material values (§9: "parse the byte as-is
/// and reject only if it overflows the enum range"). No source names the
/// values, so this is a validated newtype rather than an invented enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionMaterial(pub u8);

const NUM_COLLISION_MATERIALS: u8 = 10;

fn read_collision_material(r: &mut Reader<'_>) -> Result<CollisionMaterial, AssetError> {
    let byte = r.u8()?;
    if byte >= NUM_COLLISION_MATERIALS {
        return Err(AssetError::InvalidCollisionMaterial(byte));
    }
    Ok(CollisionMaterial(byte))
}

#[derive(Clone, Debug)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub material: CollisionMaterial,
}

fn read_triangle_mesh(r: &mut Reader<'_>) -> Result<TriangleMesh, AssetError> {
    let num_vertices = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut vertices = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        vertices.push(r.vec3()?);
    }
    let num_indices = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut indices = Vec::with_capacity(num_indices);
    for _ in 0..num_indices {
        indices.push(r.u32_le()?);
    }
    let material = read_collision_material(r)?;
    Ok(TriangleMesh {
        vertices,
        indices,
        material,
    })
}

#[derive(Clone, Debug)]
pub struct TriggerArea {
    pub bounds: BoundingBox,
}

#[derive(Clone, Debug)]
pub struct Locator {
    pub transform: glam::Mat4,
}

/// `u16 LE num_vertices, num_vertices × Vec3, u16 LE num_triangles,
/// num_triangles × { 6 × u16 LE refs, 3 × f32 LE costs, u8 movement_properties }`
/// (§6, verbatim).
#[derive(Clone, Debug)]
pub struct NavTriangle {
    pub refs: [u16; 6],
    pub costs: [f32; 3],
    pub movement_properties: u8,
}

#[derive(Clone, Debug)]
pub struct NavMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<NavTriangle>,
}

fn read_nav_mesh(r: &mut Reader<'_>) -> Result<NavMesh, AssetError> {
    let num_vertices = r.u16_le()? as usize;
    let mut vertices = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        vertices.push(r.vec3()?);
    }
    let num_triangles = r.u16_le()? as usize;
    let mut triangles = Vec::with_capacity(num_triangles);
    for _ in 0..num_triangles {
        let mut refs = [0u16; 6];
        for v in refs.iter_mut() {
            *v = r.u16_le()?;
        }
        let mut costs = [0f32; 3];
        for v in costs.iter_mut() {
            *v = r.f32_le()?;
        }
        let movement_properties = r.u8()?;
        triangles.push(NavTriangle {
            refs,
            costs,
            movement_properties,
        });
    }
    Ok(NavMesh { vertices, triangles })
}

#[derive(Debug)]
pub struct LevelModel {
    pub bi_tree_model: Box<super::AssetVariant>,
    pub animated_parts: Vec<AnimatedLevelPart>,
    pub lights: Vec<Light>,
    pub effect_storages: Vec<NamedBlob>,
    pub physics_entity_storages: Vec<NamedBlob>,
    pub liquids: Vec<NamedBlob>,
    pub force_fields: Vec<NamedBlob>,
    pub collision_meshes: Vec<Option<TriangleMesh>>,
    pub camera_collision_mesh: Option<TriangleMesh>,
    pub trigger_areas: NamedMap<TriggerArea>,
    pub locators: NamedMap<Locator>,
    pub nav_mesh: NavMesh,
}

const NUM_COLLISION_MESH_SLOTS: usize = 10;

pub fn read_level_model(r: &mut Reader<'_>, registry: &TypeReaderRegistry) -> Result<LevelModel, AssetError> {
    let bi_tree_model = Box::new(read_asset_expecting(r, registry, AssetKind::BiTreeModel)?);

    let num_animated_parts = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut animated_parts = Vec::with_capacity(num_animated_parts);
    for _ in 0..num_animated_parts {
        animated_parts.push(read_animated_level_part(r, registry)?);
    }

    let num_lights = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut lights = Vec::with_capacity(num_lights);
    for _ in 0..num_lights {
        lights.push(read_light(r)?);
    }

    let effect_storages = read_named_blob_list(r)?;
    let physics_entity_storages = read_named_blob_list(r)?;
    let liquids = read_named_blob_list(r)?;
    let force_fields = read_named_blob_list(r)?;

    // Collision-mesh list (§6): up to 10 iterations of `bool present;
    // [TriangleMesh]`; absent entries are skipped, not filled.
    let mut collision_meshes = Vec::with_capacity(NUM_COLLISION_MESH_SLOTS);
    for _ in 0..NUM_COLLISION_MESH_SLOTS {
        if r.bool()? {
            collision_meshes.push(Some(read_triangle_mesh(r)?));
        } else {
            collision_meshes.push(None);
        }
    }

    let camera_collision_mesh = if r.bool()? {
        Some(read_triangle_mesh(r)?)
    } else {
        None
    };

    let num_trigger_areas = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut trigger_areas = NamedMap::with_capacity(num_trigger_areas);
    for _ in 0..num_trigger_areas {
        let name = r.read_7bit_length_string()?;
        let bounds = read_bounding_box(r)?;
        trigger_areas.insert(name, TriggerArea { bounds });
    }

    let num_locators = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut locators = NamedMap::with_capacity(num_locators);
    for _ in 0..num_locators {
        let name = r.read_7bit_length_string()?;
        let transform = r.mat4x4()?;
        locators.insert(name, Locator { transform });
    }

    let nav_mesh = read_nav_mesh(r)?;

    Ok(LevelModel {
        bi_tree_model,
        animated_parts,
        lights,
        effect_storages,
        physics_entity_storages,
        liquids,
        force_fields,
        collision_meshes,
        camera_collision_mesh,
        trigger_areas,
        locators,
        nav_mesh,
    })
}

fn read_named_blob_list(r: &mut Reader<'_>) -> Result<Vec<NamedBlob>, AssetError> {
    let count = r.read_7bit_encoded_i32()?.max(0) as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(read_named_blob(r)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_material_rejects_out_of_range() {
        let bytes = [10u8];
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            read_collision_material(&mut r),
            Err(AssetError::InvalidCollisionMaterial(10))
        ));
    }

    #[test]
    fn collision_material_accepts_max_valid_value() {
        let bytes = [9u8];
        let mut r = Reader::new(&bytes);
        assert_eq!(read_collision_material(&mut r).unwrap(), CollisionMaterial(9));
    }

    #[test]
    fn nav_mesh_with_no_vertices_or_triangles() {
        let bytes = [0u8, 0, 0, 0];
        let mut r = Reader::new(&bytes);
        let mesh = read_nav_mesh(&mut r).unwrap();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.triangles.is_empty());
    }
}
