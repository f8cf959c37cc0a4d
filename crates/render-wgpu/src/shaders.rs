/// WGSL Phong shader for textured or flat-colored primitives lit by up to
/// four point lights. Block layouts mirror `uniforms::FrameUniforms` and
/// `uniforms::ObjectUniforms`.
pub const SCENE_SHADER: &str = r#"
struct PointLight {
    position: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
};

struct Frame {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    view_position: vec4<f32>,
    flags: vec4<u32>,
    lights: array<PointLight, 4>,
};

struct Object {
    model: mat4x4<f32>,
    object_color: vec4<f32>,
    material_diffuse: vec4<f32>,
    material_specular: vec4<f32>,
    uv_scale: vec4<f32>,
    texture: vec4<i32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> object: Object;

@group(2) @binding(0)
var object_texture: texture_2d<f32>;
@group(2) @binding(1)
var object_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(vertex.position, 1.0);
    let normal_matrix = mat3x3<f32>(
        object.model[0].xyz,
        object.model[1].xyz,
        object.model[2].xyz,
    );

    var out: VertexOutput;
    out.clip_position = frame.projection * frame.view * world;
    out.world_position = world.xyz;
    out.world_normal = normal_matrix * vertex.normal;
    out.uv = vertex.uv * object.uv_scale.xy;
    return out;
}

fn point_light(light: PointLight, normal: vec3<f32>, position: vec3<f32>, view_dir: vec3<f32>) -> vec3<f32> {
    let light_dir = normalize(light.position.xyz - position);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let shininess = max(object.material_diffuse.w, 1.0);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), shininess);

    let ambient = light.ambient.xyz * object.material_diffuse.xyz;
    let diffuse = light.diffuse.xyz * diff * object.material_diffuse.xyz;
    let specular = light.specular.xyz * spec * object.material_specular.xyz;
    return ambient + diffuse + specular;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let sampled = textureSample(object_texture, object_sampler, in.uv);
    var base = object.object_color;
    if (object.texture.x != 0) {
        base = sampled;
    }

    if (frame.flags.x == 0u) {
        return base;
    }

    let normal = normalize(in.world_normal);
    let view_dir = normalize(frame.view_position.xyz - in.world_position);
    var lighting = vec3<f32>(0.0);
    for (var i = 0u; i < 4u; i = i + 1u) {
        let light = frame.lights[i];
        if (light.position.w > 0.5) {
            lighting = lighting + point_light(light, normal, in.world_position, view_dir);
        }
    }
    return vec4<f32>(lighting * base.rgb, base.a);
}
"#;
