//! Construction of the window and the graphics back-end.
//!
//! The engine only talks to a [`Platform`]; tests substitute one that opens no window
//! and records draw calls instead of issuing them.

use tokio::runtime::Runtime;

use crate::{
    config::{EngineConfig, WindowParams},
    context::GpuContext,
    error::InitError,
    pipelines::forward::ForwardShader,
    render::ShaderProgram,
    resources::load_string,
    window::{Window, WinitWindow},
};

pub trait Platform {
    type Window: Window;
    type Shader: ShaderProgram;

    fn create_window(&mut self, params: &WindowParams) -> Result<Self::Window, InitError>;

    /// Creates the graphics context for `window` and the shader program drawing into it.
    fn init_graphics(
        &mut self,
        window: &Self::Window,
        config: &EngineConfig,
        runtime: &Runtime,
    ) -> Result<Self::Shader, InitError>;
}

/// winit window with the wgpu forward renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopPlatform;

impl Platform for DesktopPlatform {
    type Window = WinitWindow;
    type Shader = ForwardShader;

    fn create_window(&mut self, params: &WindowParams) -> Result<WinitWindow, InitError> {
        WinitWindow::new(params)
    }

    fn init_graphics(
        &mut self,
        window: &WinitWindow,
        config: &EngineConfig,
        runtime: &Runtime,
    ) -> Result<ForwardShader, InitError> {
        let ctx = runtime.block_on(GpuContext::new(
            window.handle(),
            config.window.vsync,
            config.wgpu_clear_colour(),
        ))?;

        match &config.shader_path {
            Some(path) => {
                let path = config.asset_path(path);
                let source = runtime
                    .block_on(load_string(&path))
                    .map_err(|e| InitError::Shader(format!("{e:#}")))?;
                log::info!("Using shader {}", path.display());
                Ok(ForwardShader::with_source(ctx, &source))
            }
            None => Ok(ForwardShader::new(ctx)),
        }
    }
}
