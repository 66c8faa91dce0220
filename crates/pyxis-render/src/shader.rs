//! Shaders and their uniforms.
//!
//! A [`Shader`] owns a compiled module plus a small uniform buffer. Uniforms
//! are set by name and packed in declaration order, each into its own
//! 16-byte-aligned slot (matrices take 64 bytes), which matches a WGSL struct
//! of `vec4`/`mat4x4` members declared in the same order. Scalars and
//! `vec2`/`vec3` values are zero-padded to 16 bytes.
//!
//! Every shader reads its uniforms from `@group(0) @binding(0)`. Group 1 holds
//! the two texture units at bindings 0 and 1 and a sampler at binding 2.

use crate::Color;
use glam::{Mat4, Vec2, Vec3, Vec4};
use pyxis_test_utils::{GpuBuffer, GpuShaderModule, RenderContext};
use std::borrow::Cow;
use std::sync::Arc;

/// Size of every shader's uniform buffer, in bytes.
pub const UNIFORM_BUFFER_SIZE: usize = 256;

/// A uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Color(Color),
    Mat4(Mat4),
}

impl UniformValue {
    /// Bytes this value occupies in the uniform buffer.
    pub fn slot_size(&self) -> usize {
        match self {
            UniformValue::Mat4(_) => 64,
            _ => 16,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        let start = out.len();
        match self {
            UniformValue::Float(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Int(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => out.extend_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec3(v) => out.extend_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec4(v) => out.extend_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Color(c) => out.extend_from_slice(bytemuck::cast_slice(&c.to_array())),
            UniformValue::Mat4(m) => {
                out.extend_from_slice(bytemuck::cast_slice(&m.to_cols_array()))
            }
        }
        out.resize(start + self.slot_size(), 0);
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Color> for UniformValue {
    fn from(c: Color) -> Self {
        UniformValue::Color(c)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m)
    }
}

/// A compiled shader with named uniforms.
pub struct Shader {
    name: String,
    context: Arc<dyn RenderContext>,
    module: GpuShaderModule,
    uniforms: Vec<(String, UniformValue)>,
    uniform_buffer: GpuBuffer,
    dirty: bool,
}

impl Shader {
    /// Compile a WGSL shader with `vs_main` and `fs_main` entry points.
    pub fn from_wgsl(context: Arc<dyn RenderContext>, name: &str, source: &str) -> Self {
        let module = context.create_shader_module(&wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
        });
        let uniform_buffer = context.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shader Uniform Buffer"),
            size: UNIFORM_BUFFER_SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            name: name.to_string(),
            context,
            module,
            uniforms: Vec::new(),
            uniform_buffer,
            dirty: true,
        }
    }

    /// Vertex-colored 2D shader.
    pub fn colored(context: Arc<dyn RenderContext>) -> Self {
        let mut shader = Self::from_wgsl(context, "colored", COLORED_SHADER);
        shader.set_uniform("projection", Mat4::IDENTITY);
        shader
    }

    /// Textured 2D shader: unit 0 modulated by unit 1 and the vertex color.
    pub fn textured(context: Arc<dyn RenderContext>) -> Self {
        let mut shader = Self::from_wgsl(context, "textured", TEXTURED_SHADER);
        shader.set_uniform("projection", Mat4::IDENTITY);
        shader
    }

    /// Lit static-mesh shader.
    pub fn mesh(context: Arc<dyn RenderContext>) -> Self {
        let mut shader = Self::from_wgsl(context, "mesh", MESH_SHADER);
        shader.set_uniform("view_projection", Mat4::IDENTITY);
        shader.set_uniform("model", Mat4::IDENTITY);
        shader.set_uniform("light_direction", Vec4::new(-0.3, -1.0, -0.5, 0.0));
        shader.set_uniform("tint", Color::WHITE);
        shader
    }

    /// Set a uniform, appending it if the name is new.
    ///
    /// # Panics
    /// Panics if the packed uniforms would exceed [`UNIFORM_BUFFER_SIZE`].
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.uniforms.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
        let size: usize = self.uniforms.iter().map(|(_, v)| v.slot_size()).sum();
        assert!(
            size <= UNIFORM_BUFFER_SIZE,
            "shader '{}' uniforms need {} bytes, limit is {}",
            self.name,
            size,
            UNIFORM_BUFFER_SIZE
        );
        self.dirty = true;
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Uniforms packed as they are uploaded.
    pub fn packed_uniforms(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(UNIFORM_BUFFER_SIZE);
        for (_, value) in &self.uniforms {
            value.write_to(&mut bytes);
        }
        bytes
    }

    /// Upload changed uniforms and make this shader current.
    pub fn apply(&mut self) {
        if self.dirty {
            let bytes = self.packed_uniforms();
            if !bytes.is_empty() {
                self.context.write_buffer(&self.uniform_buffer, 0, &bytes);
            }
            self.dirty = false;
        }
        self.context.use_shader(&self.module, &self.uniform_buffer);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &GpuShaderModule {
        &self.module
    }

    pub fn uniform_buffer(&self) -> &GpuBuffer {
        &self.uniform_buffer
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.context.destroy_buffer(&self.uniform_buffer);
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("uniforms", &self.uniforms)
            .finish()
    }
}

pub const COLORED_SHADER: &str = r#"
struct Globals {
    projection: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(4) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = globals.projection * vec4<f32>(in.position, 0.0, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

pub const TEXTURED_SHADER: &str = r#"
struct Globals {
    projection: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var primary_texture: texture_2d<f32>;
@group(1) @binding(1)
var secondary_texture: texture_2d<f32>;
@group(1) @binding(2)
var texture_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(2) uv: vec2<f32>,
    @location(4) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = globals.projection * vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let primary = textureSample(primary_texture, texture_sampler, in.uv);
    let secondary = textureSample(secondary_texture, texture_sampler, in.uv);
    return primary * secondary * in.color;
}
"#;

pub const MESH_SHADER: &str = r#"
struct Globals {
    view_projection: mat4x4<f32>,
    model: mat4x4<f32>,
    light_direction: vec4<f32>,
    tint: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var primary_texture: texture_2d<f32>;
@group(1) @binding(2)
var texture_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = globals.view_projection * globals.model * vec4<f32>(in.position, 1.0);
    out.normal = (globals.model * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light = normalize(-globals.light_direction.xyz);
    let diffuse = max(dot(normalize(in.normal), light), 0.0) * 0.8 + 0.2;
    let base = textureSample(primary_texture, texture_sampler, in.uv) * globals.tint;
    return vec4<f32>(base.rgb * diffuse, base.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pyxis_test_utils::MockRenderContext;

    fn mock() -> Arc<MockRenderContext> {
        Arc::new(MockRenderContext::new())
    }

    #[test]
    fn uniforms_pack_in_declaration_order_with_padding() {
        let mut shader = Shader::from_wgsl(mock(), "test", COLORED_SHADER);
        shader.set_uniform("scale", 2.0f32);
        shader.set_uniform("matrix", Mat4::IDENTITY);
        shader.set_uniform("offset", Vec2::new(1.0, 3.0));

        let bytes = shader.packed_uniforms();
        assert_eq!(bytes.len(), 16 + 64 + 16);
        assert_eq!(&bytes[0..4], bytemuck::bytes_of(&2.0f32));
        assert_eq!(&bytes[4..16], &[0; 12]);
        assert_eq!(&bytes[16..20], bytemuck::bytes_of(&1.0f32));
        assert_eq!(&bytes[80..88], bytemuck::cast_slice::<f32, u8>(&[1.0, 3.0]));
    }

    #[test]
    fn setting_existing_uniform_replaces_in_place() {
        let mut shader = Shader::colored(mock());
        let ortho = Mat4::orthographic_rh(0.0, 10.0, 10.0, 0.0, -1.0, 1.0);
        shader.set_uniform("projection", ortho);

        assert_eq!(shader.uniform("projection"), Some(UniformValue::Mat4(ortho)));
        assert_eq!(shader.packed_uniforms().len(), 64);
    }

    #[test]
    fn apply_uploads_only_when_dirty() {
        let ctx = mock();
        let mut shader = Shader::textured(ctx.clone());

        shader.apply();
        shader.apply();
        assert_eq!(ctx.buffer_writes(shader.uniform_buffer()).len(), 1);

        shader.set_uniform("projection", Mat4::from_scale(Vec3::splat(2.0)));
        shader.apply();
        assert_eq!(ctx.buffer_writes(shader.uniform_buffer()).len(), 2);
    }

    #[test]
    #[should_panic(expected = "uniforms need")]
    fn oversized_uniform_block_is_rejected() {
        let mut shader = Shader::from_wgsl(mock(), "big", COLORED_SHADER);
        for i in 0..5 {
            shader.set_uniform(&format!("m{i}"), Mat4::IDENTITY);
        }
    }
}
