//! WGSL programs. Every program shares the frame uniform block at group 0
//! and the per-instance attributes at locations 3..=9.

use pickview_render::ShadingMode;

/// Frame uniforms, vertex and instance inputs shared by all programs.
pub const COMMON: &str = r#"
const MAX_LIGHTS: u32 = 4u;

struct FrameUniforms {
    projectionMatrix: mat4x4<f32>,
    viewMatrix: mat4x4<f32>,
    lightPosition: array<vec4<f32>, 4>,
    lightColour: array<vec4<f32>, 4>,
    attenuation: array<vec4<f32>, 4>,
    skyColour: vec4<f32>,
    cameraPosition: vec4<f32>,
    wireframe: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) textureCoords: vec2<f32>,
    @location(2) normal: vec3<f32>,
};

struct InstanceInput {
    @location(3) transformationMatrix_0: vec4<f32>,
    @location(4) transformationMatrix_1: vec4<f32>,
    @location(5) transformationMatrix_2: vec4<f32>,
    @location(6) transformationMatrix_3: vec4<f32>,
    @location(7) texOffset: vec2<f32>,
    @location(8) gObjectIndex: f32,
    @location(9) drawIndex: f32,
};

fn transformationMatrix(instance: InstanceInput) -> mat4x4<f32> {
    return mat4x4<f32>(
        instance.transformationMatrix_0,
        instance.transformationMatrix_1,
        instance.transformationMatrix_2,
        instance.transformationMatrix_3,
    );
}

const FOG_DENSITY: f32 = 0.0035;
const FOG_GRADIENT: f32 = 5.0;

fn fogVisibility(relativeToCamera: vec4<f32>) -> f32 {
    let distance = length(relativeToCamera.xyz);
    return clamp(exp(-pow(distance * FOG_DENSITY, FOG_GRADIENT)), 0.0, 1.0);
}
"#;

/// Texture and material bindings at groups 1 and 2.
pub const MATERIAL: &str = r#"
struct MaterialUniforms {
    shineDamper: f32,
    reflectivity: f32,
    useFakeLighting: f32,
    numberOfTextureRows: f32,
};

@group(1) @binding(0)
var modelTexture: texture_2d<f32>;
@group(1) @binding(1)
var modelSampler: sampler;

@group(2) @binding(0)
var<uniform> material: MaterialUniforms;

const ALPHA_CUTOFF: f32 = 0.5;
"#;

/// Lighting shared by the entity and terrain programs.
pub const LIGHTING: &str = r#"
struct Lighting {
    diffuse: vec3<f32>,
    specular: vec3<f32>,
};

fn computeLighting(worldPosition: vec3<f32>, surfaceNormal: vec3<f32>, toCamera: vec3<f32>) -> Lighting {
    let unitNormal = normalize(surfaceNormal);
    let unitToCamera = normalize(toCamera);
    var diffuse = vec3<f32>(0.0);
    var specular = vec3<f32>(0.0);
    for (var i = 0u; i < MAX_LIGHTS; i = i + 1u) {
        let toLight = frame.lightPosition[i].xyz - worldPosition;
        let distance = length(toLight);
        let att = frame.attenuation[i];
        let factor = att.x + att.y * distance + att.z * distance * distance;
        let unitLight = toLight / max(distance, 0.0001);
        let brightness = max(dot(unitNormal, unitLight), 0.0);
        let reflected = reflect(-unitLight, unitNormal);
        let specularFactor = max(dot(reflected, unitToCamera), 0.0);
        let damped = pow(specularFactor, material.shineDamper);
        let colour = frame.lightColour[i].xyz / max(factor, 0.0001);
        diffuse = diffuse + brightness * colour;
        specular = specular + damped * material.reflectivity * colour;
    }
    var out: Lighting;
    out.diffuse = max(diffuse, vec3<f32>(0.2));
    out.specular = specular;
    return out;
}

fn shade(texel: vec4<f32>, lighting: Lighting, visibility: f32) -> vec4<f32> {
    if (frame.wireframe > 0.5) {
        return vec4<f32>(lighting.diffuse, 1.0);
    }
    let lit = vec4<f32>(lighting.diffuse, 1.0) * texel + vec4<f32>(lighting.specular, 0.0);
    return mix(vec4<f32>(frame.skyColour.xyz, 1.0), lit, visibility);
}
"#;

/// Entity program. `NORMAL_INTERPOLATION` selects smooth or flat normals.
pub const ENTITY: &str = r#"
struct EntityOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) passTextureCoords: vec2<f32>,
    @location(1) NORMAL_INTERPOLATION surfaceNormal: vec3<f32>,
    @location(2) worldPosition: vec3<f32>,
    @location(3) toCameraVector: vec3<f32>,
    @location(4) visibility: f32,
};

@vertex
fn vs_entity(vertex: VertexInput, instance: InstanceInput) -> EntityOutput {
    let model = transformationMatrix(instance);
    let worldPosition = model * vec4<f32>(vertex.position, 1.0);
    let relativeToCamera = frame.viewMatrix * worldPosition;

    var normal = vertex.normal;
    if (material.useFakeLighting > 0.5) {
        normal = vec3<f32>(0.0, 1.0, 0.0);
    }

    var out: EntityOutput;
    out.clip_position = frame.projectionMatrix * relativeToCamera;
    out.passTextureCoords = vertex.textureCoords / material.numberOfTextureRows + instance.texOffset;
    out.surfaceNormal = (model * vec4<f32>(normal, 0.0)).xyz;
    out.worldPosition = worldPosition.xyz;
    out.toCameraVector = frame.cameraPosition.xyz - worldPosition.xyz;
    out.visibility = fogVisibility(relativeToCamera);
    return out;
}

@fragment
fn fs_entity(in: EntityOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(modelTexture, modelSampler, in.passTextureCoords);
    if (texel.a < ALPHA_CUTOFF && frame.wireframe < 0.5) {
        discard;
    }
    let lighting = computeLighting(in.worldPosition, in.surfaceNormal, in.toCameraVector);
    return shade(texel, lighting, in.visibility);
}
"#;

/// Terrain program: the texture tiles across each tile.
pub const TERRAIN: &str = r#"
const TERRAIN_TILING: f32 = 40.0;

struct TerrainOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) passTextureCoords: vec2<f32>,
    @location(1) surfaceNormal: vec3<f32>,
    @location(2) worldPosition: vec3<f32>,
    @location(3) toCameraVector: vec3<f32>,
    @location(4) visibility: f32,
};

@vertex
fn vs_terrain(vertex: VertexInput, instance: InstanceInput) -> TerrainOutput {
    let model = transformationMatrix(instance);
    let worldPosition = model * vec4<f32>(vertex.position, 1.0);
    let relativeToCamera = frame.viewMatrix * worldPosition;

    var out: TerrainOutput;
    out.clip_position = frame.projectionMatrix * relativeToCamera;
    out.passTextureCoords = vertex.textureCoords * TERRAIN_TILING;
    out.surfaceNormal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.worldPosition = worldPosition.xyz;
    out.toCameraVector = frame.cameraPosition.xyz - worldPosition.xyz;
    out.visibility = fogVisibility(relativeToCamera);
    return out;
}

@fragment
fn fs_terrain(in: TerrainOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(modelTexture, modelSampler, in.passTextureCoords);
    let lighting = computeLighting(in.worldPosition, in.surfaceNormal, in.toCameraVector);
    return shade(texel, lighting, in.visibility);
}
"#;

/// Picking program: writes (object index, draw index, primitive id).
/// Cut-out texels are discarded so clicks fall through to what is behind.
pub const PICKING: &str = r#"
struct PickOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) passTextureCoords: vec2<f32>,
    @location(1) @interpolate(flat) objectIndex: f32,
    @location(2) @interpolate(flat) drawIndex: f32,
};

@vertex
fn vs_pick(vertex: VertexInput, instance: InstanceInput) -> PickOutput {
    let model = transformationMatrix(instance);
    var out: PickOutput;
    out.clip_position = frame.projectionMatrix * frame.viewMatrix * model * vec4<f32>(vertex.position, 1.0);
    out.passTextureCoords = vertex.textureCoords / material.numberOfTextureRows + instance.texOffset;
    out.objectIndex = instance.gObjectIndex;
    out.drawIndex = instance.drawIndex;
    return out;
}

@fragment
fn fs_pick(in: PickOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(modelTexture, modelSampler, in.passTextureCoords);
    if (texel.a < ALPHA_CUTOFF) {
        discard;
    }
    return vec4<f32>(in.objectIndex, in.drawIndex, 0.0, 1.0);
}
"#;

pub fn entity_source(shading: ShadingMode) -> String {
    let interpolation = match shading {
        ShadingMode::Smooth => "",
        ShadingMode::Flat => "@interpolate(flat)",
    };
    format!("{COMMON}{MATERIAL}{LIGHTING}{}", ENTITY.replace("NORMAL_INTERPOLATION", interpolation))
}

pub fn terrain_source() -> String {
    format!("{COMMON}{MATERIAL}{LIGHTING}{TERRAIN}")
}

pub fn picking_source() -> String {
    format!("{COMMON}{MATERIAL}{PICKING}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIFORMS: [&str; 11] = [
        "transformationMatrix",
        "projectionMatrix",
        "viewMatrix",
        "lightPosition",
        "lightColour",
        "attenuation",
        "shineDamper",
        "reflectivity",
        "useFakeLighting",
        "skyColour",
        "numberOfTextureRows",
    ];

    #[test]
    fn entity_programs_declare_uniform_contract() {
        for shading in [ShadingMode::Smooth, ShadingMode::Flat] {
            let src = entity_source(shading);
            for name in UNIFORMS.iter().chain(&["wireframe", "texOffset"]) {
                assert!(src.contains(name), "{shading:?} missing {name}");
            }
            assert!(!src.contains("NORMAL_INTERPOLATION"));
        }
    }

    #[test]
    fn flat_program_uses_flat_normals() {
        assert!(entity_source(ShadingMode::Flat).contains("@interpolate(flat) surfaceNormal"));
        assert!(!entity_source(ShadingMode::Smooth).contains("@interpolate(flat) surfaceNormal"));
    }

    #[test]
    fn picking_program_writes_object_index() {
        let src = picking_source();
        assert!(src.contains("gObjectIndex"));
        assert!(src.contains("fn fs_pick"));
        assert!(!src.contains("computeLighting"));
    }

    #[test]
    fn picking_discards_cutout_texels() {
        let src = picking_source();
        let fragment = &src[src.find("fn fs_pick").unwrap()..];
        assert!(fragment.contains("textureSample(modelTexture"));
        assert!(fragment.contains("texel.a < ALPHA_CUTOFF"));
        assert!(fragment.contains("discard"));
        assert!(src.contains("material.numberOfTextureRows + instance.texOffset"));
    }

    #[test]
    fn terrain_program_has_fog_and_lights() {
        let src = terrain_source();
        assert!(src.contains("fogVisibility"));
        assert!(src.contains("computeLighting"));
    }
}
