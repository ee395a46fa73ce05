use std::sync::mpsc;

use easel_render::{FramebufferSpec, PickError};

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const ID_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Sint;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Color, id and depth textures of the editor viewport.
pub(crate) struct RenderTargets {
    width: u32,
    height: u32,
    color_view: wgpu::TextureView,
    id_texture: wgpu::Texture,
    id_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let color = create_texture(
            device,
            "viewport_color",
            COLOR_FORMAT,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let id_texture = create_texture(
            device,
            "viewport_entity_id",
            ID_FORMAT,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let depth = create_texture(
            device,
            "viewport_depth",
            DEPTH_FORMAT,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        Self {
            width,
            height,
            color_view: color.create_view(&Default::default()),
            id_view: id_texture.create_view(&Default::default()),
            id_texture,
            depth_view: depth.create_view(&Default::default()),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn id_view(&self) -> &wgpu::TextureView {
        &self.id_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Read one id texel. `(x, y)` has a bottom-left origin; the texture is
    /// stored top-down, so the row is flipped before the copy.
    pub fn read_id(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        attachment: usize,
        x: i32,
        y: i32,
    ) -> Result<i32, PickError> {
        let spec = FramebufferSpec::editor(self.width, self.height);
        let format = *spec
            .attachments
            .get(attachment)
            .ok_or(PickError::NoSuchAttachment(attachment))?;
        if !format.is_integer() {
            return Err(PickError::NotAnIntegerAttachment(attachment));
        }
        let (width, height) = (self.width as i32, self.height as i32);
        if x < 0 || y < 0 || x >= width || y >= height {
            return Err(PickError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let row = texture_row(y, self.height);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("id_readback"),
            size: u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("id_readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.id_texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: x as u32,
                    y: row,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
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

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| PickError::Readback(e.to_string()))?
            .map_err(|e| PickError::Readback(e.to_string()))?;

        let value = {
            let bytes = slice.get_mapped_range();
            decode_texel(&bytes)
        };
        buffer.unmap();
        value
    }
}

/// Texture row holding bottom-left pixel row `y`.
pub(crate) fn texture_row(y: i32, height: u32) -> u32 {
    height - 1 - y as u32
}

fn decode_texel(bytes: &[u8]) -> Result<i32, PickError> {
    let head = bytes
        .get(..size_of::<i32>())
        .ok_or_else(|| PickError::Readback("short readback buffer".into()))?;
    Ok(bytemuck::pod_read_unaligned(head))
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_flip_to_top_down() {
        assert_eq!(texture_row(0, 100), 99);
        assert_eq!(texture_row(99, 100), 0);
    }

    #[test]
    fn texel_decodes_signed_ids() {
        let mut bytes = [0u8; 256];
        bytes[..4].copy_from_slice(&(-1i32).to_ne_bytes());
        assert_eq!(decode_texel(&bytes).unwrap(), -1);
        bytes[..4].copy_from_slice(&42i32.to_ne_bytes());
        assert_eq!(decode_texel(&bytes).unwrap(), 42);
        assert!(decode_texel(&bytes[..2]).is_err());
    }
}
