//! Textures: decoded pixel data and the GPU resources created from it.
//!
//! # Key types
//!
//! - [`Texture`] is the decoded image, shared by reference between materials
//! - [`GpuTexture`] wraps the WGPU texture, view and sampler of an uploaded image
//!
//! Decoding happens when a texture is loaded; the upload to the GPU is deferred until
//! the first draw that samples it.

use std::{cell::OnceCell, fmt, path::PathBuf, rc::Rc};

use image::GenericImageView;

use crate::error::TextureError;

pub type SharedTexture = Rc<Texture>;

/// How colour values stored in a texture are interpreted by the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColourSpace {
    Srgb,
    /// Normal maps and other data textures.
    Linear,
}

pub struct Texture {
    pub name: String,
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Channel count of the source image (3 or 4).
    pub channels: u8,
    pub colour_space: ColourSpace,
    /// RGBA8 rows, bottom row first.
    pixels: Vec<u8>,
    gpu: OnceCell<GpuTexture>,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("uploaded", &self.is_uploaded())
            .finish()
    }
}

impl Texture {
    /// Decode an encoded image (PNG, JPEG, ...).
    ///
    /// The image is flipped vertically so texture coordinates with their origin in the
    /// bottom-left corner sample it the right way up. Only RGB and RGBA sources are
    /// accepted.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?;
        let channels = img.color().channel_count();
        if channels != 3 && channels != 4 {
            return Err(TextureError::UnsupportedChannels(channels));
        }
        let (width, height) = img.dimensions();
        let pixels = img.flipv().to_rgba8().into_raw();
        Ok(Self {
            name: name.to_string(),
            path: None,
            width,
            height,
            channels,
            colour_space: ColourSpace::Srgb,
            pixels,
            gpu: OnceCell::new(),
        })
    }

    /// A texture filled with one colour.
    pub fn solid(name: &str, rgba: [u8; 4], colour_space: ColourSpace) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            width: 1,
            height: 1,
            channels: 4,
            colour_space,
            pixels: rgba.to_vec(),
            gpu: OnceCell::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_colour_space(mut self, colour_space: ColourSpace) -> Self {
        self.colour_space = colour_space;
        self
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }

    /// The GPU copy of this texture, uploading it on first use.
    pub fn gpu(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> &GpuTexture {
        self.gpu.get_or_init(|| {
            let format = match self.colour_space {
                ColourSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
                ColourSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
            };
            GpuTexture::from_rgba(
                device,
                queue,
                &self.pixels,
                [self.width, self.height],
                format,
                &self.name,
            )
        })
    }
}

/// A GPU texture with its view and sampler.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth attachment matching a surface of `size` pixels. Zero sizes are bumped to 1.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let [width, height] = size.map(|s| s.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        // Never sampled; kept so every GpuTexture has the same shape.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Upload tightly packed RGBA8 rows.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        dimensions: [u32; 2],
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: dimensions[0],
            height: dimensions[1],
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions[0]),
                rows_per_image: Some(dimensions[1]),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_default_sampler(device);
        Self {
            texture,
            view,
            sampler,
        }
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

/// Stand-ins bound when a material leaves a map empty.
pub struct DefaultTextures {
    /// White base colour and specular map.
    pub white: Texture,
    /// The blue/purple-ish colour that represents "no deformation" in a normal map.
    pub flat_normal: Texture,
}

impl Default for DefaultTextures {
    fn default() -> Self {
        Self {
            white: Texture::solid("default white", [255, 255, 255, 255], ColourSpace::Srgb),
            flat_normal: Texture::solid(
                "default normal map",
                [127, 127, 255, 255],
                ColourSpace::Linear,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb, Rgba};

    use super::*;

    fn encode_png(img: impl Into<DynamicImage>) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        img.into().write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn rgba_png_is_flipped_vertically() {
        let img = ImageBuffer::from_fn(1, 2, |_, y| {
            if y == 0 {
                Rgba([255u8, 0, 0, 255])
            } else {
                Rgba([0u8, 0, 255, 255])
            }
        });
        let texture = Texture::from_bytes("tile", &encode_png(img)).unwrap();
        assert_eq!((texture.width, texture.height, texture.channels), (1, 2, 4));
        // The former bottom row (blue) comes first.
        assert_eq!(&texture.pixels()[0..4], &[0, 0, 255, 255]);
        assert_eq!(&texture.pixels()[4..8], &[255, 0, 0, 255]);
        assert!(!texture.is_uploaded());
    }

    #[test]
    fn rgb_png_is_expanded_to_rgba() {
        let img = ImageBuffer::from_pixel(2, 2, Rgb([10u8, 20, 30]));
        let texture = Texture::from_bytes("rgb", &encode_png(img)).unwrap();
        assert_eq!(texture.channels, 3);
        assert_eq!(texture.pixels().len(), 2 * 2 * 4);
        assert_eq!(&texture.pixels()[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn greyscale_is_rejected() {
        let img = ImageBuffer::from_pixel(2, 2, Luma([128u8]));
        let err = Texture::from_bytes("grey", &encode_png(img)).unwrap_err();
        assert!(matches!(err, TextureError::UnsupportedChannels(1)));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = Texture::from_bytes("junk", b"definitely not an image").unwrap_err();
        assert!(matches!(err, TextureError::Decode(_)));
    }
}
