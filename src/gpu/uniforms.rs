//! Named uniform state and its upload into the shader's uniform block.
//!
//! A [`UniformSet`] is built once from the reflected program and a fixed
//! schema, so every entry is known to exist with the right type before the
//! first frame. Input handlers mutate it between frames; the
//! [`UniformBridge`] packs it into a staging block by type tag and uploads the
//! block in a single write per frame.

use std::collections::BTreeMap;
use std::fmt;

use super::context::SetupError;
use super::program::ProgramInfo;

/// The type tag of a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Scalar,
    Vec2,
    Mat4,
}

impl UniformKind {
    /// Size in bytes of a value of this kind.
    pub fn size(self) -> usize {
        match self {
            UniformKind::Scalar => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Mat4 => 64,
        }
    }

    /// WGSL spelling of the type.
    pub fn name(self) -> &'static str {
        match self {
            UniformKind::Scalar => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed uniform value. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Vec2([f32; 2]),
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Scalar(_) => UniformKind::Scalar,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// The zero value of a kind; matrices default to identity.
    pub fn default_for(kind: UniformKind) -> Self {
        match kind {
            UniformKind::Scalar => UniformValue::Scalar(0.0),
            UniformKind::Vec2 => UniformValue::Vec2([0.0; 2]),
            UniformKind::Mat4 => UniformValue::Mat4(glam::Mat4::IDENTITY.to_cols_array()),
        }
    }

    fn as_floats(&self) -> &[f32] {
        match self {
            UniformValue::Scalar(v) => std::slice::from_ref(v),
            UniformValue::Vec2(v) => v,
            UniformValue::Mat4(m) => m,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Scalar(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<glam::Vec2> for UniformValue {
    fn from(v: glam::Vec2) -> Self {
        UniformValue::Vec2(v.to_array())
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(m: [f32; 16]) -> Self {
        UniformValue::Mat4(m)
    }
}

impl From<glam::Mat4> for UniformValue {
    fn from(m: glam::Mat4) -> Self {
        UniformValue::Mat4(m.to_cols_array())
    }
}

/// Where a uniform lives in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

/// One resolved entry of a [`UniformSet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    pub slot: UniformSlot,
    pub value: UniformValue,
}

/// Uniforms the ribbon shader must declare.
pub const RIBBON_UNIFORMS: &[(&str, UniformKind)] = &[
    ("thickness", UniformKind::Scalar),
    ("aspect", UniformKind::Scalar),
    ("polar", UniformKind::Scalar),
    ("mouse", UniformKind::Vec2),
    ("projection", UniformKind::Mat4),
    ("view", UniformKind::Mat4),
    ("model", UniformKind::Mat4),
];

/// Errors raised when updating a [`UniformSet`] between frames.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UniformError {
    #[error("Unknown uniform `{0}`")]
    Unknown(String),
    #[error("Uniform `{name}` is {expected}, cannot assign {found}")]
    KindMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
}

/// Name → slot and current value, validated against the program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSet {
    uniforms: BTreeMap<String, Uniform>,
    block_size: u32,
}

impl UniformSet {
    /// Resolve every schema entry against the reflected program.
    pub fn from_program(
        program: &ProgramInfo,
        schema: &[(&str, UniformKind)],
    ) -> Result<Self, SetupError> {
        let mut uniforms = BTreeMap::new();

        for &(name, expected) in schema {
            let slot = program
                .uniform(name)
                .ok_or_else(|| SetupError::MissingUniform(name.to_string()))?;
            if slot.kind != expected {
                return Err(SetupError::UniformTypeMismatch {
                    name: name.to_string(),
                    expected,
                    found: slot.kind,
                });
            }
            uniforms.insert(
                name.to_string(),
                Uniform {
                    slot,
                    value: UniformValue::default_for(expected),
                },
            );
        }

        for (name, _) in program.uniforms() {
            if !uniforms.contains_key(name) {
                log::warn!("Uniform `{}` is not driven and stays zeroed", name);
            }
        }

        Ok(Self {
            uniforms,
            block_size: program.uniform_block_size(),
        })
    }

    /// Assign a value, keeping the declared type.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), UniformError> {
        let value = value.into();
        let uniform = self
            .uniforms
            .get_mut(name)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))?;

        if uniform.slot.kind != value.kind() {
            return Err(UniformError::KindMismatch {
                name: name.to_string(),
                expected: uniform.slot.kind,
                found: value.kind(),
            });
        }

        uniform.value = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name).map(|u| &u.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    /// Size in bytes of the uniform block this set fills.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }
}

/// CPU copy of the uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(size: u32) -> Self {
        Self {
            bytes: vec![0; size as usize],
        }
    }

    /// Write every value of `uniforms` at its slot offset.
    pub fn write(&mut self, uniforms: &UniformSet) {
        for (_, uniform) in uniforms.iter() {
            let start = uniform.slot.offset as usize;
            let src: &[u8] = bytemuck::cast_slice(uniform.value.as_floats());
            // Slots come from reflection of this block, so they always fit.
            if let Some(dst) = self.bytes.get_mut(start..start + src.len()) {
                dst.copy_from_slice(src);
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Uploads a [`UniformSet`] into the GPU uniform buffer once per frame.
pub struct UniformBridge {
    block: UniformBlock,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformBridge {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, block_size: u32) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ribbon_uniforms"),
            size: block_size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ribbon_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            block: UniformBlock::new(block_size),
            buffer,
            bind_group,
        }
    }

    /// Pack and upload the current values.
    pub fn upload(&mut self, queue: &wgpu::Queue, uniforms: &UniformSet) {
        self.block.write(uniforms);
        queue.write_buffer(&self.buffer, 0, self.block.as_bytes());
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn block(&self) -> &UniformBlock {
        &self.block
    }
}
