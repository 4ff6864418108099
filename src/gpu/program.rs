//! Ribbon shader program: reflection, verification and pipeline creation.
//!
//! The WGSL source is parsed and validated with naga before any GPU object is
//! created, so compile errors and schema mismatches surface as [`SetupError`]s
//! from a plain function call.

use std::collections::BTreeMap;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Module, Scalar, ScalarKind, ShaderStage, TypeInner, VectorSize};
use wgpu::{BindGroupLayout, Device, RenderPipeline, TextureFormat};

use super::context::SetupError;
use super::layouts::{uniform_block_layout, SectionLayouts};
use super::uniforms::{UniformKind, UniformSlot};

/// WGSL source of the ribbon shader.
pub const RIBBON_SHADER: &str = include_str!("shaders/ribbon.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;

/// Type of a per-vertex input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Scalar,
    Vec2,
}

impl AttributeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar => "f32",
            Self::Vec2 => "vec2<f32>",
        }
    }

    pub fn vertex_format(&self) -> wgpu::VertexFormat {
        match self {
            Self::Scalar => wgpu::VertexFormat::Float32,
            Self::Vec2 => wgpu::VertexFormat::Float32x2,
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Vertex inputs the ribbon mesh provides, in vertex buffer slot order.
pub const RIBBON_ATTRIBUTES: [(&str, AttributeKind); 3] = [
    ("position", AttributeKind::Vec2),
    ("normal", AttributeKind::Vec2),
    ("miter", AttributeKind::Scalar),
];

/// A resolved vertex input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSlot {
    pub location: u32,
    pub kind: AttributeKind,
}

/// Validated attribute locations and uniform layout of a shader program.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInfo {
    attributes: [AttributeSlot; 3],
    uniforms: BTreeMap<String, UniformSlot>,
    uniform_block_size: u32,
}

impl ProgramInfo {
    /// Compile and verify `source` against the ribbon's attribute schema.
    pub fn reflect(source: &str) -> Result<Self, SetupError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| SetupError::ShaderCompile(e.emit_to_string(source)))?;

        Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .map_err(|e| SetupError::ShaderCompile(e.emit_to_string(source)))?;

        if !module
            .entry_points
            .iter()
            .any(|ep| ep.stage == ShaderStage::Fragment && ep.name == FRAGMENT_ENTRY)
        {
            return Err(SetupError::MissingEntryPoint(FRAGMENT_ENTRY.to_string()));
        }

        let inputs = vertex_inputs(&module)?;
        let mut attributes = [AttributeSlot {
            location: 0,
            kind: AttributeKind::Scalar,
        }; 3];
        for (slot, &(name, expected)) in attributes.iter_mut().zip(RIBBON_ATTRIBUTES.iter()) {
            let (location, inner) = inputs
                .get(name)
                .ok_or_else(|| SetupError::MissingAttribute(name.to_string()))?;
            match classify_attribute(inner) {
                Some(kind) if kind == expected => {
                    *slot = AttributeSlot {
                        location: *location,
                        kind,
                    }
                }
                _ => {
                    return Err(SetupError::AttributeTypeMismatch {
                        name: name.to_string(),
                        expected,
                        found: format!("{:?}", inner),
                    })
                }
            }
        }

        let (uniforms, uniform_block_size) = uniform_block(&module)?;
        log::debug!(
            "Reflected program: {} uniform(s) in a {}-byte block",
            uniforms.len(),
            uniform_block_size
        );

        Ok(Self {
            attributes,
            uniforms,
            uniform_block_size,
        })
    }

    /// Location of an attribute in [`RIBBON_ATTRIBUTES`] order.
    pub fn attributes(&self) -> &[AttributeSlot; 3] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeSlot> {
        RIBBON_ATTRIBUTES
            .iter()
            .position(|(n, _)| *n == name)
            .map(|i| self.attributes[i])
    }

    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, UniformSlot)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn uniform_block_size(&self) -> u32 {
        self.uniform_block_size
    }
}

/// Map a naga type onto a vertex input type.
fn classify_attribute(inner: &TypeInner) -> Option<AttributeKind> {
    match *inner {
        TypeInner::Scalar(Scalar::F32) => Some(AttributeKind::Scalar),
        TypeInner::Vector {
            size: VectorSize::Bi,
            scalar: Scalar::F32,
        } => Some(AttributeKind::Vec2),
        _ => None,
    }
}

/// Map a naga type onto a supported uniform type tag.
fn classify(inner: &TypeInner) -> Option<UniformKind> {
    match *inner {
        TypeInner::Scalar(Scalar::F32) => Some(UniformKind::Scalar),
        TypeInner::Vector {
            size: VectorSize::Bi,
            scalar: Scalar::F32,
        } => Some(UniformKind::Vec2),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar.kind == ScalarKind::Float && scalar.width == 4 => Some(UniformKind::Mat4),
        _ => None,
    }
}

/// Named `@location` inputs of the vertex entry point, flattening structs.
fn vertex_inputs(module: &Module) -> Result<BTreeMap<String, (u32, TypeInner)>, SetupError> {
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == ShaderStage::Vertex && ep.name == VERTEX_ENTRY)
        .ok_or_else(|| SetupError::MissingEntryPoint(VERTEX_ENTRY.to_string()))?;

    let mut inputs = BTreeMap::new();
    for arg in &entry.function.arguments {
        let ty = &module.types[arg.ty];
        match (&arg.binding, &ty.inner) {
            (Some(Binding::Location { location, .. }), inner) => {
                if let Some(name) = &arg.name {
                    inputs.insert(name.clone(), (*location, inner.clone()));
                }
            }
            (None, TypeInner::Struct { members, .. }) => {
                for member in members {
                    if let (Some(Binding::Location { location, .. }), Some(name)) =
                        (&member.binding, &member.name)
                    {
                        let inner = module.types[member.ty].inner.clone();
                        inputs.insert(name.clone(), (*location, inner));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(inputs)
}

/// Members of the uniform block at the fixed group/binding.
fn uniform_block(module: &Module) -> Result<(BTreeMap<String, UniformSlot>, u32), SetupError> {
    let missing = SetupError::MissingUniformBlock {
        group: UNIFORM_GROUP,
        binding: UNIFORM_BINDING,
    };

    let global = module
        .global_variables
        .iter()
        .map(|(_, var)| var)
        .find(|var| {
            var.space == AddressSpace::Uniform
                && var
                    .binding
                    .as_ref()
                    .is_some_and(|b| b.group == UNIFORM_GROUP && b.binding == UNIFORM_BINDING)
        })
        .ok_or(missing)?;

    let TypeInner::Struct { members, span } = &module.types[global.ty].inner else {
        return Err(SetupError::UnsupportedUniformType {
            name: global.name.clone().unwrap_or_default(),
            ty: format!("{:?}", module.types[global.ty].inner),
        });
    };

    let mut uniforms = BTreeMap::new();
    for member in members {
        let name = member.name.clone().unwrap_or_default();
        let inner = &module.types[member.ty].inner;
        let kind = classify(inner).ok_or_else(|| SetupError::UnsupportedUniformType {
            name: name.clone(),
            ty: format!("{:?}", inner),
        })?;
        uniforms.insert(
            name,
            UniformSlot {
                offset: member.offset,
                kind,
            },
        );
    }

    Ok((uniforms, *span))
}

/// Compiled ribbon render pipeline and its reflected interface.
pub struct RibbonProgram {
    pub info: ProgramInfo,
    pub pipeline: RenderPipeline,
    pub bind_group_layout: BindGroupLayout,
}

impl RibbonProgram {
    /// Build the pipeline from the bundled ribbon shader.
    pub fn new(device: &Device, format: TextureFormat) -> Result<Self, SetupError> {
        Self::from_source(device, format, RIBBON_SHADER)
    }

    /// Build the pipeline from custom WGSL implementing the ribbon interface.
    pub fn from_source(
        device: &Device,
        format: TextureFormat,
        source: &str,
    ) -> Result<Self, SetupError> {
        let info = ProgramInfo::reflect(source)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ribbon_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout =
            uniform_block_layout(device, UNIFORM_BINDING, info.uniform_block_size() as u64);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ribbon_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let sections = SectionLayouts::new(&info.attributes);
        let buffers = sections.buffers();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ribbon_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Miter offsets can fold a quad over at sharp joints.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::info!("Ribbon pipeline created for {:?}", format);

        Ok(Self {
            info,
            pipeline,
            bind_group_layout,
        })
    }
}
