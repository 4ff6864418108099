//! Offscreen frame texture and its CPU readback.

use wgpu::{Device, Texture, TextureFormat, TextureUsages, TextureView};

/// Errors raised while reading rendered pixels back to the CPU.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to map readback buffer: {0}")]
    MapFailed(#[from] wgpu::BufferAsyncError),
    #[error("Device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("Readback callback was dropped before completing")]
    CallbackDropped,
}

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of an RGBA8 image in a texture-to-buffer copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    /// Bytes of pixel data per row.
    pub tight: u32,
    /// Bytes per row in the copy, aligned to `COPY_BYTES_PER_ROW_ALIGNMENT`.
    pub padded: u32,
}

impl RowLayout {
    pub fn for_width(width: u32) -> Self {
        let tight = width * BYTES_PER_PIXEL;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        Self {
            tight,
            padded: tight.div_ceil(align) * align,
        }
    }

    /// Append the pixel bytes of `rows` padded rows to `out`.
    pub fn unpad_into(&self, data: &[u8], rows: u32, out: &mut Vec<u8>) {
        out.reserve((self.tight * rows) as usize);
        for row in data.chunks(self.padded as usize).take(rows as usize) {
            out.extend_from_slice(&row[..self.tight as usize]);
        }
    }
}

/// A color target the ribbon is drawn into, plus a mappable buffer it is
/// copied to for capture.
pub struct OffscreenFrame {
    texture: Texture,
    view: TextureView,
    readback: wgpu::Buffer,
    rows: RowLayout,
    width: u32,
    height: u32,
}

impl OffscreenFrame {
    pub fn new(device: &Device, width: u32, height: u32, format: TextureFormat) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ribbon_frame"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let rows = RowLayout::for_width(width);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ribbon_readback"),
            size: rows.padded as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            texture,
            view,
            readback,
            rows,
            width,
            height,
        }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn rows(&self) -> RowLayout {
        self.rows
    }

    /// Record a copy of the frame texture into the readback buffer.
    pub fn encode_copy(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            self.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.rows.padded),
                    rows_per_image: Some(self.height),
                },
            },
            self.texture.size(),
        );
    }

    /// Block until the copied pixels are mapped and return them tightly packed.
    pub fn read_pixels(&self, device: &Device) -> Result<Vec<u8>, CaptureError> {
        let slice = self.readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device.poll(wgpu::PollType::wait_indefinitely())?;
        receiver.recv().map_err(|_| CaptureError::CallbackDropped)??;

        let mut pixels = Vec::new();
        self.rows
            .unpad_into(&slice.get_mapped_range(), self.height, &mut pixels);
        self.readback.unmap();

        debug_assert_eq!(pixels.len(), (self.width * self.height * BYTES_PER_PIXEL) as usize);
        Ok(pixels)
    }
}
