//! Vertex and bind group layouts of the ribbon pipeline.

use std::num::NonZeroU64;

use wgpu::{BindGroupLayout, Device, ShaderStages, VertexAttribute, VertexBufferLayout};

use super::program::AttributeSlot;

/// One tightly packed vertex buffer per attribute.
///
/// The mesh stores positions, normals and miters as separate sections, so
/// each attribute gets its own slot with offset zero.
pub struct SectionLayouts {
    attributes: [[VertexAttribute; 1]; 3],
}

impl SectionLayouts {
    /// Layouts for the given attributes, in vertex buffer slot order.
    pub fn new(attributes: &[AttributeSlot; 3]) -> Self {
        Self {
            attributes: attributes.map(|slot| {
                [VertexAttribute {
                    offset: 0,
                    shader_location: slot.location,
                    format: slot.kind.vertex_format(),
                }]
            }),
        }
    }

    pub fn buffers(&self) -> [VertexBufferLayout<'_>; 3] {
        std::array::from_fn(|slot| {
            let attributes = &self.attributes[slot];
            VertexBufferLayout {
                array_stride: attributes[0].format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            }
        })
    }
}

/// Layout with a single uniform block visible to both stages.
pub fn uniform_block_layout(device: &Device, binding: u32, block_size: u64) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("ribbon_uniform_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(block_size),
            },
            count: None,
        }],
    })
}
