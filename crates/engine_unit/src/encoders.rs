//! Built-in component encoders.
//!
//! Each encoder reads its component's `data` and emits one fixed-layout,
//! `#[repr(C)]` record. The runtime reads the same structs back out of the
//! unit resource, so field order and sizes are part of the resource format.
//!
//! Physics encoders (collider, actor, joint) live with the physics
//! integration and register through [`ComponentTypeRegistry::register`].

use bytemuck::{Pod, Zeroable};
use engine_component::{fnv1a_32, fnv1a_64};
use glam::{Quat, Vec3};
use serde::Deserialize;
use serde_json::Value;

use crate::error::CompileError;
use crate::registry::{ComponentTypeRegistry, EncodeContext};

/// 64-bit id of a resource, the FNV-1a hash of its name.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Hash a resource name (e.g. `"units/props/crate"`).
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a_64(name.as_bytes()))
    }
}

/// Register every built-in encoder with its spawn order.
///
/// Transforms spawn first because every other component attaches to them.
pub fn register_builtin_components(registry: &mut ComponentTypeRegistry) {
    registry.register("transform", encode_transform, 0);
    registry.register("camera", encode_camera, 1);
    registry.register("mesh_renderer", encode_mesh_renderer, 1);
    registry.register("sprite_renderer", encode_sprite_renderer, 1);
    registry.register("light", encode_light, 1);
    registry.register("script", encode_script, 1);
    registry.register("animation_state_machine", encode_animation_state_machine, 1);
}

fn to_bytes<T: Pod>(desc: &T) -> Vec<u8> {
    bytemuck::bytes_of(desc).to_vec()
}

fn bool32(value: bool) -> u32 {
    u32::from(value)
}

// ── Transform ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TransformSource {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
}

/// Packed transform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformDesc {
    pub position: [f32; 3],
    /// Quaternion `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

/// Encode a `transform` component.
///
/// # Errors
///
/// Fails if `position`, `rotation` or `scale` is missing or malformed.
pub fn encode_transform(data: &Value, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, CompileError> {
    let src: TransformSource = ctx.parse(data)?;
    Ok(to_bytes(&TransformDesc {
        position: src.position.to_array(),
        rotation: src.rotation.to_array(),
        scale: src.scale.to_array(),
    }))
}

// ── Camera ──────────────────────────────────────────────────────────────────

/// Camera projection kinds, as stored in [`CameraDesc::projection`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective = 0,
    Orthographic = 1,
}

impl ProjectionType {
    fn from_name(name: &str) -> Result<Self, CompileError> {
        match name {
            "perspective" => Ok(Self::Perspective),
            "orthographic" => Ok(Self::Orthographic),
            _ => Err(CompileError::UnknownVariant {
                kind: "projection",
                name: name.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct CameraSource {
    projection: String,
    fov: f32,
    near_range: f32,
    far_range: f32,
}

/// Packed camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraDesc {
    pub projection: u32,
    pub fov: f32,
    pub near_range: f32,
    pub far_range: f32,
}

/// Encode a `camera` component.
///
/// # Errors
///
/// Fails on an unknown `projection` or missing fields.
pub fn encode_camera(data: &Value, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, CompileError> {
    let src: CameraSource = ctx.parse(data)?;
    let projection = ProjectionType::from_name(&src.projection)?;
    Ok(to_bytes(&CameraDesc {
        projection: projection as u32,
        fov: src.fov,
        near_range: src.near_range,
        far_range: src.far_range,
    }))
}

// ── Light ───────────────────────────────────────────────────────────────────

/// Light kinds, as stored in [`LightDesc::light_type`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Directional = 0,
    Omni = 1,
    Spot = 2,
}

impl LightType {
    fn from_name(name: &str) -> Result<Self, CompileError> {
        match name {
            "directional" => Ok(Self::Directional),
            "omni" => Ok(Self::Omni),
            "spot" => Ok(Self::Spot),
            _ => Err(CompileError::UnknownVariant {
                kind: "light",
                name: name.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct LightSource {
    #[serde(rename = "type")]
    light_type: String,
    range: f32,
    intensity: f32,
    spot_angle: f32,
    color: Vec3,
}

/// Packed light.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightDesc {
    pub light_type: u32,
    pub range: f32,
    pub intensity: f32,
    pub spot_angle: f32,
    pub color: [f32; 3],
}

/// Encode a `light` component.
///
/// # Errors
///
/// Fails on an unknown light `type` or missing fields.
pub fn encode_light(data: &Value, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, CompileError> {
    let src: LightSource = ctx.parse(data)?;
    let light_type = LightType::from_name(&src.light_type)?;
    Ok(to_bytes(&LightDesc {
        light_type: light_type as u32,
        range: src.range,
        intensity: src.intensity,
        spot_angle: src.spot_angle,
        color: src.color.to_array(),
    }))
}

// ── Renderers ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MeshRendererSource {
    mesh_resource: String,
    geometry_name: String,
    material: String,
    visible: bool,
}

/// Packed mesh renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MeshRendererDesc {
    pub mesh_resource: ResourceId,
    pub material_resource: ResourceId,
    /// FNV-1a 32 of the geometry's name inside the mesh.
    pub geometry_name: u32,
    pub visible: u32,
}

/// Encode a `mesh_renderer` component.
///
/// # Errors
///
/// Fails if the mesh resource does not exist or fields are missing.
pub fn encode_mesh_renderer(data: &Value, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, CompileError> {
    let src: MeshRendererSource = ctx.parse(data)?;
    ctx.require_resource("mesh", &src.mesh_resource)?;
    Ok(to_bytes(&MeshRendererDesc {
        mesh_resource: ResourceId::from_name(&src.mesh_resource),
        material_resource: ResourceId::from_name(&src.material),
        geometry_name: fnv1a_32(src.geometry_name.as_bytes()),
        visible: bool32(src.visible),
    }))
}

#[derive(Deserialize)]
struct SpriteRendererSource {
    sprite_resource: String,
    material: String,
    layer: u32,
    depth: u32,
    visible: bool,
}

/// Packed sprite renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct SpriteRendererDesc {
    pub sprite_resource: ResourceId,
    pub material_resource: ResourceId,
    pub layer: u32,
    pub depth: u32,
    pub visible: u32,
    pub _pad: u32,
}

/// Encode a `sprite_renderer` component.
///
/// # Errors
///
/// Fails if the sprite resource does not exist or fields are missing.
pub fn encode_sprite_renderer(data: &Value, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, CompileError> {
    let src: SpriteRendererSource = ctx.parse(data)?;
    ctx.require_resource("sprite", &src.sprite_resource)?;
    Ok(to_bytes(&SpriteRendererDesc {
        sprite_resource: ResourceId::from_name(&src.sprite_resource),
        material_resource: ResourceId::from_name(&src.material),
        layer: src.layer,
        depth: src.depth,
        visible: bool32(src.visible),
        _pad: 0,
    }))
}

// ── Script & animation ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ScriptSource {
    script_resource: String,
}

/// Packed script reference.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ScriptDesc {
    pub script_resource: ResourceId,
}

/// Encode a `script` component.
///
/// # Errors
///
/// Fails if the lua resource does not exist.
pub fn encode_script(data: &Value, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, CompileError> {
    let src: ScriptSource = ctx.parse(data)?;
    ctx.require_resource("lua", &src.script_resource)?;
    Ok(to_bytes(&ScriptDesc {
        script_resource: ResourceId::from_name(&src.script_resource),
    }))
}

#[derive(Deserialize)]
struct AnimationStateMachineSource {
    state_machine_resource: String,
}

/// Packed animation state machine reference.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct AnimationStateMachineDesc {
    pub state_machine_resource: ResourceId,
}

/// Encode an `animation_state_machine` component.
///
/// # Errors
///
/// Fails if the state machine resource does not exist.
pub fn encode_animation_state_machine(
    data: &Value,
    ctx: &EncodeContext<'_>,
) -> Result<Vec<u8>, CompileError> {
    let src: AnimationStateMachineSource = ctx.parse(data)?;
    ctx.require_resource("state_machine", &src.state_machine_resource)?;
    Ok(to_bytes(&AnimationStateMachineDesc {
        state_machine_resource: ResourceId::from_name(&src.state_machine_resource),
    }))
}

#[cfg(test)]
mod tests {
    use engine_component::ComponentTypeId;
    use serde_json::json;

    use super::*;
    use crate::source::MemorySource;

    fn decode<T: Pod>(bytes: &[u8]) -> T {
        assert_eq!(bytes.len(), std::mem::size_of::<T>());
        bytemuck::pod_read_unaligned(bytes)
    }

    #[test]
    fn test_transform() {
        let source = MemorySource::new();
        let ctx = EncodeContext::new(&source, "transform");
        let bytes = encode_transform(
            &json!({ "position": [1, 2, 3], "rotation": [0, 0, 0, 1], "scale": [2, 2, 2] }),
            &ctx,
        )
        .unwrap();

        let desc: TransformDesc = decode(&bytes);
        assert_eq!(desc.position, [1.0, 2.0, 3.0]);
        assert_eq!(desc.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(desc.scale, [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_transform_missing_field() {
        let source = MemorySource::new();
        let ctx = EncodeContext::new(&source, "transform");
        let err = encode_transform(&json!({ "position": [0, 0, 0] }), &ctx).unwrap_err();
        assert!(matches!(err, CompileError::ComponentData { .. }));
    }

    #[test]
    fn test_camera() {
        let source = MemorySource::new();
        let ctx = EncodeContext::new(&source, "camera");
        let bytes = encode_camera(
            &json!({ "projection": "orthographic", "fov": 45.0, "near_range": 0.1, "far_range": 100.0 }),
            &ctx,
        )
        .unwrap();

        let desc: CameraDesc = decode(&bytes);
        assert_eq!(desc.projection, ProjectionType::Orthographic as u32);
        assert_eq!(desc.fov, 45.0);
        assert_eq!(desc.far_range, 100.0);
    }

    #[test]
    fn test_camera_unknown_projection() {
        let source = MemorySource::new();
        let ctx = EncodeContext::new(&source, "camera");
        let err = encode_camera(
            &json!({ "projection": "fisheye", "fov": 45.0, "near_range": 0.1, "far_range": 100.0 }),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnknownVariant { kind: "projection", ref name } if name == "fisheye"
        ));
    }

    #[test]
    fn test_light() {
        let source = MemorySource::new();
        let ctx = EncodeContext::new(&source, "light");
        let bytes = encode_light(
            &json!({
                "type": "spot", "range": 10.0, "intensity": 2.0,
                "spot_angle": 30.0, "color": [1.0, 0.5, 0.25]
            }),
            &ctx,
        )
        .unwrap();

        let desc: LightDesc = decode(&bytes);
        assert_eq!(desc.light_type, LightType::Spot as u32);
        assert_eq!(desc.color, [1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_light_unknown_type() {
        let source = MemorySource::new();
        let ctx = EncodeContext::new(&source, "light");
        let err = encode_light(
            &json!({
                "type": "area", "range": 1.0, "intensity": 1.0,
                "spot_angle": 0.0, "color": [1, 1, 1]
            }),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownVariant { kind: "light", .. }));
    }

    #[test]
    fn test_mesh_renderer_requires_mesh() {
        let data = json!({
            "mesh_resource": "props/crate",
            "geometry_name": "Cube",
            "material": "props/wood",
            "visible": true
        });

        let missing = MemorySource::new();
        let ctx = EncodeContext::new(&missing, "mesh_renderer");
        assert!(matches!(
            encode_mesh_renderer(&data, &ctx),
            Err(CompileError::MissingResource { kind: "mesh", .. })
        ));

        let present = MemorySource::new().with_resource("mesh", "props/crate");
        let ctx = EncodeContext::new(&present, "mesh_renderer");
        let desc: MeshRendererDesc = decode(&encode_mesh_renderer(&data, &ctx).unwrap());
        assert_eq!(desc.mesh_resource, ResourceId::from_name("props/crate"));
        assert_eq!(desc.material_resource, ResourceId::from_name("props/wood"));
        assert_eq!(desc.geometry_name, fnv1a_32(b"Cube"));
        assert_eq!(desc.visible, 1);
    }

    #[test]
    fn test_sprite_renderer() {
        let source = MemorySource::new().with_resource("sprite", "ui/cursor");
        let ctx = EncodeContext::new(&source, "sprite_renderer");
        let bytes = encode_sprite_renderer(
            &json!({
                "sprite_resource": "ui/cursor", "material": "ui/default",
                "layer": 2, "depth": 7, "visible": false
            }),
            &ctx,
        )
        .unwrap();
        let desc: SpriteRendererDesc = decode(&bytes);
        assert_eq!((desc.layer, desc.depth, desc.visible, desc._pad), (2, 7, 0, 0));
    }

    #[test]
    fn test_script_and_state_machine() {
        let source = MemorySource::new()
            .with_resource("lua", "scripts/door")
            .with_resource("state_machine", "anim/door");

        let ctx = EncodeContext::new(&source, "script");
        let desc: ScriptDesc =
            decode(&encode_script(&json!({ "script_resource": "scripts/door" }), &ctx).unwrap());
        assert_eq!(desc.script_resource, ResourceId::from_name("scripts/door"));
        assert!(encode_script(&json!({ "script_resource": "scripts/gone" }), &ctx).is_err());

        let ctx = EncodeContext::new(&source, "animation_state_machine");
        let desc: AnimationStateMachineDesc = decode(
            &encode_animation_state_machine(&json!({ "state_machine_resource": "anim/door" }), &ctx)
                .unwrap(),
        );
        assert_eq!(desc.state_machine_resource, ResourceId::from_name("anim/door"));
    }

    #[test]
    fn test_builtin_registration() {
        let mut registry = ComponentTypeRegistry::new();
        register_builtin_components(&mut registry);
        assert_eq!(registry.len(), 7);
        assert_eq!(
            registry.spawn_order()[0].type_id,
            ComponentTypeId::from_name("transform")
        );
        assert!(registry.spawn_order()[1..].iter().all(|info| info.spawn_order == 1));
    }
}
