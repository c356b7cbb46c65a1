//! Error types for every failure class the engine distinguishes.
//!
//! - [`InitError`] aborts startup (window, graphics context, shader).
//! - [`ImportError`] and [`TextureError`] are asset failures: the caller logs them and
//!   keeps running with a partial scene.
//! - [`FrameError`] is raised by a [`ShaderProgram`](crate::render::ShaderProgram) while
//!   drawing; the orchestrator logs it and skips the affected draw.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("could not create the window: {0}")]
    Window(String),
    #[error("could not initialise the graphics context: {0}")]
    Graphics(String),
    #[error("could not create the shader program: {0}")]
    Shader(String),
    #[error("could not start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("engine is {found:?}, expected {expected:?}")]
    InvalidState {
        expected: crate::flow::EngineState,
        found: crate::flow::EngineState,
    },
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("no shader program is active")]
    MissingProgram,
    #[error("uniform `{0}` could not be resolved")]
    UnresolvedUniform(&'static str),
    #[error("mesh `{0}` has no GPU buffers")]
    UnreadyMesh(String),
    #[error("surface could not provide a frame: {0}")]
    Surface(&'static str),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Gltf(#[from] gltf::Error),
    #[error(transparent)]
    Obj(#[from] tobj::LoadError),
    #[error("scene in {0} is incomplete")]
    IncompleteScene(PathBuf),
    #[error("mesh `{mesh}` has only {vertices} vertices")]
    DegenerateMesh { mesh: String, vertices: usize },
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Decode(#[from] image::ImageError),
    #[error("textures need 3 or 4 channels, found {0}")]
    UnsupportedChannels(u8),
}
