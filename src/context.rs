use std::sync::Arc;

use winit::window::Window;

use crate::{data_structures::texture::GpuTexture, error::InitError};

/// Device, queue and the configured window surface.
#[derive(Debug)]
pub struct GpuContext {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: GpuTexture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub clear_colour: wgpu::Color,
}

impl GpuContext {
    pub async fn new(
        window: Arc<Window>,
        vsync: bool,
        clear_colour: wgpu::Color,
    ) -> Result<Self, InitError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| InitError::Graphics(format!("could not create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| InitError::Graphics(format!("no suitable adapter: {e}")))?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| InitError::Graphics(format!("could not open device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Textures are uploaded as sRGB, so the surface must be sRGB too or colours come
        // out too dark.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| InitError::Graphics("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            GpuTexture::create_depth_texture(&device, [config.width, config.height], "depth");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            clear_colour,
        })
    }

    /// Reconfigures the surface; zero sizes (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            GpuTexture::create_depth_texture(&self.device, [width, height], "depth");
    }

    /// Reconfigures at the window's current size after the surface was lost.
    pub fn reconfigure(&mut self) {
        let size = self.window.inner_size();
        self.resize(size.width, size.height);
    }
}
