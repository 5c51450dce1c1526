// ============================================================================
// GPU SHADERS — all WGSL code kept inline for containment
// ============================================================================

// ============================================================================
// MESH SHADER — textured model with one point light + ambient term
// ============================================================================
//
// `SceneUniforms` below (and in the UV pick shader) mirrors
// `renderer::SceneUniforms`.
pub const MESH_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    light_pos: vec4<f32>,      // world space, w unused
    light_color: vec4<f32>,    // rgb, a = ambient strength
};

@group(0) @binding(0) var<uniform> scene: SceneUniforms;
@group(1) @binding(0) var canvas_tex: texture_2d<f32>;
@group(1) @binding(1) var canvas_samp: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = scene.model * vec4<f32>(in.position, 1.0);
    out.clip = scene.view_proj * world;
    out.world_pos = world.xyz;
    // model matrix is a pure rotation, so it also transforms normals
    out.normal = (scene.model * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(canvas_tex, canvas_samp, in.uv);
    let n = normalize(in.normal);
    let l = normalize(scene.light_pos.xyz - in.world_pos);
    let diffuse = max(dot(n, l), 0.0);
    let ambient = scene.light_color.a;
    let lit = albedo.rgb * scene.light_color.rgb * (ambient + (1.0 - ambient) * diffuse);
    return vec4<f32>(lit, 1.0);
}
"#;

// ============================================================================
// UV PICK SHADER — writes each fragment's texture coordinate as its color
// ============================================================================
//
// Rendered into an Rgba32Float target cleared to (0, 0, 0, 0).  Covered
// texels get (u, v, 0, 1); alpha separates geometry from background.  The
// UV is written unwrapped; decoding wraps it like the repeat sampler.
pub const UV_PICK_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    light_pos: vec4<f32>,
    light_color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> scene: SceneUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_uv(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip = scene.view_proj * (scene.model * vec4<f32>(in.position, 1.0));
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_uv(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.uv, 0.0, 1.0);
}
"#;
