//! GPU-resident vertex and index storage for the ribbon mesh.
//!
//! Every frame the whole vertex and index contents are rewritten from offset
//! zero; nothing is patched in place. A buffer is only reallocated when the
//! mesh size changes, which happens at most once per session.

use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::geometry::{RibbonGeometry, VertexLayout, INDICES_PER_POINT};

/// Vertex and index buffers for one ribbon, bound for an indexed draw.
pub struct RibbonBuffers {
    vertex: Buffer,
    index: Buffer,
    layout: VertexLayout,
    draw_count: u32,
}

fn create_buffer(device: &Device, label: &str, size: u64, usage: BufferUsages) -> Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        // Zero-sized buffers cannot be bound.
        size: size.max(wgpu::COPY_BUFFER_ALIGNMENT),
        usage: usage | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn index_bytes(point_count: usize) -> u64 {
    (point_count * INDICES_PER_POINT * std::mem::size_of::<u16>()) as u64
}

impl RibbonBuffers {
    /// Allocate buffers for `point_count` points.
    pub fn new(device: &Device, point_count: usize) -> Self {
        let layout = VertexLayout::new(point_count);
        Self {
            vertex: create_buffer(device, "ribbon_vertices", layout.byte_len(), BufferUsages::VERTEX),
            index: create_buffer(device, "ribbon_indices", index_bytes(point_count), BufferUsages::INDEX),
            layout,
            draw_count: 0,
        }
    }

    /// Replace the GPU contents with the current frame's mesh.
    ///
    /// Does not wait for the GPU; the queue orders the write before any draw
    /// submitted afterwards.
    pub fn upload(&mut self, device: &Device, queue: &Queue, geometry: &RibbonGeometry) {
        let vertices = geometry.vertices();
        let layout = vertices.layout();
        if !geometry.is_ready() {
            self.draw_count = 0;
            return;
        }

        if layout != self.layout {
            log::debug!(
                "Reallocating ribbon buffers: {} -> {} points",
                self.layout.point_count(),
                layout.point_count()
            );
            self.vertex = create_buffer(device, "ribbon_vertices", layout.byte_len(), BufferUsages::VERTEX);
            self.index = create_buffer(
                device,
                "ribbon_indices",
                index_bytes(layout.point_count()),
                BufferUsages::INDEX,
            );
            self.layout = layout;
        }

        queue.write_buffer(&self.vertex, 0, vertices.as_bytes());
        queue.write_buffer(&self.index, 0, bytemuck::cast_slice(geometry.indices()));
        self.draw_count = geometry.draw_count();
    }

    /// Bind the three attribute sections and the index buffer.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        let layout = &self.layout;
        pass.set_vertex_buffer(
            0,
            self.vertex
                .slice(layout.positions_offset()..layout.normals_offset()),
        );
        pass.set_vertex_buffer(
            1,
            self.vertex
                .slice(layout.normals_offset()..layout.miters_offset()),
        );
        pass.set_vertex_buffer(2, self.vertex.slice(layout.miters_offset()..layout.byte_len()));
        pass.set_index_buffer(self.index.slice(..), wgpu::IndexFormat::Uint16);
    }

    /// Number of indices to draw; zero until a mesh has been uploaded.
    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }
}
