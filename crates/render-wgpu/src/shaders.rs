/// WGSL shader shared by every pipeline variant. Writes display color to
/// target 0 and the flat entity id to target 1. A zero normal marks unlit
/// geometry.
pub const SCENE_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    lights: array<vec4<f32>, 8>,
    light_count: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> scene: SceneUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) entity_id: i32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) @interpolate(flat) entity_id: i32,
};

struct FragmentOutput {
    @location(0) color: vec4<f32>,
    @location(1) entity_id: i32,
};

const AMBIENT: f32 = 0.3;

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = scene.view_proj * vec4<f32>(vertex.position, 1.0);
    out.world_position = vertex.position;
    out.normal = vertex.normal;
    out.color = vertex.color;
    out.entity_id = vertex.entity_id;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> FragmentOutput {
    var rgb = in.color.rgb;
    if (length(in.normal) > 0.5) {
        let normal = normalize(in.normal);
        var diffuse = 0.0;
        for (var i = 0u; i < scene.light_count.x; i = i + 1u) {
            let light = scene.lights[i];
            let to_light = light.xyz - in.world_position;
            if (length(to_light) > 0.0) {
                diffuse = diffuse + light.w * abs(dot(normal, normalize(to_light)));
            }
        }
        rgb = rgb * min(AMBIENT + (1.0 - AMBIENT) * diffuse, 1.0);
    }

    var out: FragmentOutput;
    out.color = vec4<f32>(rgb, in.color.a);
    out.entity_id = in.entity_id;
    return out;
}
"#;
