//! Offscreen pick target: a float colour attachment plus its own depth
//! attachment. The pick pass writes `(object index, draw index, 0)` per
//! pixel; single pixels are read back on demand.

use pickview_render::{PickBufferError, PickTarget, PickedPixel, TexelOrigin};

use crate::pipelines::{DEPTH_FORMAT, PICK_FORMAT};

/// `copy_texture_to_buffer` needs rows aligned to this.
const READBACK_ROW_BYTES: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
const TEXEL_BYTES: usize = 16;

pub struct PickBuffer {
    colour: wgpu::Texture,
    colour_view: wgpu::TextureView,
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    width: u32,
    height: u32,
}

impl PickBuffer {
    /// Create attachments for a `width` x `height` window. A zero size or a
    /// rejected allocation is reported as [`PickBufferError::Incomplete`].
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, PickBufferError> {
        if width == 0 || height == 0 {
            return Err(PickBufferError::Incomplete {
                width,
                height,
                reason: "zero-sized attachment".into(),
            });
        }
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let colour = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pick_colour"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pick_depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pick_readback"),
            size: READBACK_ROW_BYTES as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(PickBufferError::Incomplete {
                width,
                height,
                reason: err.to_string(),
            });
        }

        let colour_view = colour.create_view(&Default::default());
        let depth_view = depth.create_view(&Default::default());
        tracing::debug!(width, height, "pick buffer created");
        Ok(Self {
            colour,
            colour_view,
            depth,
            depth_view,
            readback,
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Open the pick pass. Colour clears to zero (background / group
    /// marker), depth to far.
    pub fn begin_write<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("pick_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.colour_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        })
    }

    /// Read one texel at a window point. Blocks until the GPU is done.
    pub fn read_pixel(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        x: u32,
        y: u32,
    ) -> Result<PickedPixel, PickBufferError> {
        if x >= self.width || y >= self.height {
            return Err(PickBufferError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let row = TexelOrigin::TopLeft.to_texel_y(y, self.height);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("pick_readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.colour,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y: row, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_ROW_BYTES),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = self.readback.slice(..TEXEL_BYTES as u64);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| PickBufferError::Readback(e.to_string()))?
            .map_err(|e| PickBufferError::Readback(e.to_string()))?;

        let pixel = {
            let data = slice.get_mapped_range();
            decode_texel(&data)
        };
        self.readback.unmap();
        Ok(pixel)
    }

    pub fn destroy(&self) {
        self.colour.destroy();
        self.depth.destroy();
        self.readback.destroy();
    }
}

/// Decode the first `Rgba32Float` texel of a readback row.
fn decode_texel(bytes: &[u8]) -> PickedPixel {
    let mut channels = [0.0_f32; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        let start = i * 4;
        if let Some(raw) = bytes.get(start..start + 4) {
            *channel = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }
    }
    PickedPixel::from_texel(channels)
}

/// A [`PickBuffer`] bound to the device that owns it.
pub struct GpuPickTarget<'a> {
    pub pick: &'a PickBuffer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl PickTarget for GpuPickTarget<'_> {
    fn size(&self) -> (u32, u32) {
        self.pick.size()
    }

    fn read_pixel_at(&mut self, x: u32, y: u32) -> Result<PickedPixel, PickBufferError> {
        self.pick.read_pixel(self.device, self.queue, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texel_bytes(values: [f32; 4]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn decodes_float_texel() {
        let pixel = decode_texel(&texel_bytes([7.0, 2.0, 0.0, 1.0]));
        assert_eq!(pixel.object_id, 7);
        assert_eq!(pixel.draw_id, 2);
        assert_eq!(pixel.prim_id, 0);
    }

    #[test]
    fn cleared_texel_is_background() {
        assert!(decode_texel(&texel_bytes([0.0; 4])).is_background());
        assert!(decode_texel(&[]).is_background());
    }

    #[test]
    fn readback_row_fits_one_texel() {
        assert!(READBACK_ROW_BYTES as usize >= TEXEL_BYTES);
        assert_eq!(READBACK_ROW_BYTES % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
    }
}
