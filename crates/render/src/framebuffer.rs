//! Off-screen render target with a display color attachment, an entity id
//! attachment and a depth buffer. Pixel (0, 0) is the bottom-left corner.

use glam::Vec4;

use crate::error::PickError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentFormat {
    /// Display color, 8 bits per channel.
    Rgba8,
    /// Signed integer entity ids.
    RedInteger,
    Depth,
}

impl AttachmentFormat {
    pub fn is_integer(self) -> bool {
        matches!(self, Self::RedInteger)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferSpec {
    pub width: u32,
    pub height: u32,
    pub attachments: Vec<AttachmentFormat>,
}

impl FramebufferSpec {
    /// Index of the id attachment in [`FramebufferSpec::editor`].
    pub const ID_ATTACHMENT: usize = 1;

    /// Color, id and depth, in that order.
    pub fn editor(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            attachments: vec![
                AttachmentFormat::Rgba8,
                AttachmentFormat::RedInteger,
                AttachmentFormat::Depth,
            ],
        }
    }
}

/// Anything a pixel id can be read back from.
pub trait PickingTarget {
    fn size(&self) -> (u32, u32);
    /// Reallocate every attachment. Sizes are clamped to at least 1.
    fn resize(&mut self, width: u32, height: u32);
    fn read_pixel(&self, attachment: usize, x: i32, y: i32) -> Result<i32, PickError>;
}

#[derive(Debug, Clone)]
enum Attachment {
    Rgba8(Vec<[u8; 4]>),
    RedInteger(Vec<i32>),
    Depth(Vec<f32>),
}

impl Attachment {
    fn allocate(format: AttachmentFormat, len: usize) -> Self {
        match format {
            AttachmentFormat::Rgba8 => Self::Rgba8(vec![[0; 4]; len]),
            AttachmentFormat::RedInteger => Self::RedInteger(vec![0; len]),
            AttachmentFormat::Depth => Self::Depth(vec![1.0; len]),
        }
    }
}

/// CPU framebuffer used by the software device.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    spec: FramebufferSpec,
    attachments: Vec<Attachment>,
}

impl Framebuffer {
    pub fn new(mut spec: FramebufferSpec) -> Self {
        spec.width = spec.width.max(1);
        spec.height = spec.height.max(1);
        let mut framebuffer = Self {
            spec,
            attachments: Vec::new(),
        };
        framebuffer.allocate();
        framebuffer
    }

    fn allocate(&mut self) {
        let len = self.spec.width as usize * self.spec.height as usize;
        self.attachments = self
            .spec
            .attachments
            .iter()
            .map(|&format| Attachment::allocate(format, len))
            .collect();
    }

    pub fn spec(&self) -> &FramebufferSpec {
        &self.spec
    }

    pub fn width(&self) -> u32 {
        self.spec.width
    }

    pub fn height(&self) -> u32 {
        self.spec.height
    }

    fn index(&self, x: i32, y: i32) -> Result<usize, PickError> {
        let (width, height) = (self.spec.width, self.spec.height);
        let inside = x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height;
        if !inside {
            return Err(PickError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        Ok(y as usize * width as usize + x as usize)
    }

    /// Clear every color attachment to `color`.
    pub fn clear_color(&mut self, color: Vec4) {
        let packed = pack_color(color);
        for attachment in &mut self.attachments {
            if let Attachment::Rgba8(pixels) = attachment {
                pixels.fill(packed);
            }
        }
    }

    pub fn clear_depth(&mut self) {
        for attachment in &mut self.attachments {
            if let Attachment::Depth(depth) = attachment {
                depth.fill(1.0);
            }
        }
    }

    /// Fill every integer attachment with `value`.
    pub fn clear_id_attachment(&mut self, value: i32) {
        for attachment in &mut self.attachments {
            if let Attachment::RedInteger(ids) = attachment {
                ids.fill(value);
            }
        }
    }

    /// Display color at a pixel, if a color attachment exists.
    pub fn color_at(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let i = self.index(x, y).ok()?;
        self.attachments.iter().find_map(|a| match a {
            Attachment::Rgba8(pixels) => Some(pixels[i]),
            _ => None,
        })
    }

    pub(crate) fn depth_at(&self, i: usize) -> f32 {
        self.attachments
            .iter()
            .find_map(|a| match a {
                Attachment::Depth(depth) => Some(depth[i]),
                _ => None,
            })
            .unwrap_or(1.0)
    }

    pub(crate) fn color_at_index(&self, i: usize) -> Vec4 {
        self.attachments
            .iter()
            .find_map(|a| match a {
                Attachment::Rgba8(pixels) => Some(unpack_color(pixels[i])),
                _ => None,
            })
            .unwrap_or(Vec4::ZERO)
    }

    /// Write one fragment. `id` of `None` leaves the id attachment untouched.
    pub(crate) fn write(&mut self, i: usize, color: Vec4, depth: Option<f32>, id: Option<i32>) {
        for attachment in &mut self.attachments {
            match attachment {
                Attachment::Rgba8(pixels) => pixels[i] = pack_color(color),
                Attachment::RedInteger(ids) => {
                    if let Some(id) = id {
                        ids[i] = id;
                    }
                }
                Attachment::Depth(values) => {
                    if let Some(depth) = depth {
                        values[i] = depth;
                    }
                }
            }
        }
    }
}

impl PickingTarget for Framebuffer {
    fn size(&self) -> (u32, u32) {
        (self.spec.width, self.spec.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.size() {
            return;
        }
        tracing::debug!(width, height, "framebuffer resized");
        self.spec.width = width;
        self.spec.height = height;
        self.allocate();
    }

    fn read_pixel(&self, attachment: usize, x: i32, y: i32) -> Result<i32, PickError> {
        let format = *self
            .spec
            .attachments
            .get(attachment)
            .ok_or(PickError::NoSuchAttachment(attachment))?;
        if !format.is_integer() {
            return Err(PickError::NotAnIntegerAttachment(attachment));
        }
        let i = self.index(x, y)?;
        match &self.attachments[attachment] {
            Attachment::RedInteger(ids) => Ok(ids[i]),
            _ => Err(PickError::NotAnIntegerAttachment(attachment)),
        }
    }
}

fn pack_color(color: Vec4) -> [u8; 4] {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    [
        c.x.round() as u8,
        c.y.round() as u8,
        c.z.round() as u8,
        c.w.round() as u8,
    ]
}

fn unpack_color(c: [u8; 4]) -> Vec4 {
    Vec4::new(c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32) / 255.0
}
