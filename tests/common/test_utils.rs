use std::collections::VecDeque;

use cgmath::Matrix4;
use ember_ngin::{
    camera::Camera,
    config::{EngineConfig, WindowParams},
    data_structures::{light::LightSet, material::SharedMaterial, mesh::Mesh},
    error::{FrameError, InitError},
    flow::Engine,
    input::InputEvent,
    platform::Platform,
    render::ShaderProgram,
    window::Window,
};
use tokio::runtime::Runtime;

/// A window that never opens: it replays scripted event batches, one per poll, and
/// asks to close after a fixed number of polls.
pub struct FakeWindow {
    pub params: WindowParams,
    pub polls: u32,
    close_after: Option<u32>,
    script: VecDeque<Vec<InputEvent>>,
    pending_close: bool,
    cursor_hidden: bool,
}

impl Window for FakeWindow {
    fn is_pending_close(&self) -> bool {
        self.pending_close
    }

    fn close(&mut self) {
        self.pending_close = true;
    }

    fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
        self.polls += 1;
        if let Some(batch) = self.script.pop_front() {
            events.extend(batch);
        }
        if self.close_after.is_some_and(|n| self.polls >= n) {
            self.pending_close = true;
        }
    }

    fn show_cursor(&mut self, show: bool) {
        self.cursor_hidden = !show;
    }

    fn is_cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    fn aspect_ratio(&self) -> f32 {
        self.params.aspect_ratio()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Activate,
    World,
    ModelTransform(Matrix4<f32>),
    /// Name of the bound material, `None` for the defaults.
    Material(Option<String>),
    Lights {
        directional: bool,
        points: usize,
        spots: usize,
    },
    Draw(String),
    Present,
}

/// Records every call the orchestrator makes instead of talking to a GPU.
#[derive(Default)]
pub struct RecordingShader {
    pub calls: Vec<Call>,
    pub resizes: Vec<(u32, u32)>,
    /// Draws of meshes with this name fail.
    pub failing_mesh: Option<String>,
    pub fail_present: bool,
}

impl RecordingShader {
    pub fn frames(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Present).count()
    }

    pub fn draws(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn materials(&self) -> Vec<Option<String>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Material(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn model_transforms(&self) -> Vec<Matrix4<f32>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::ModelTransform(m) => Some(*m),
                _ => None,
            })
            .collect()
    }
}

impl ShaderProgram for RecordingShader {
    fn activate(&mut self) -> Result<(), FrameError> {
        self.calls.push(Call::Activate);
        Ok(())
    }

    fn set_world_transform(&mut self, _camera: &Camera) -> Result<(), FrameError> {
        self.calls.push(Call::World);
        Ok(())
    }

    fn set_model_transform(&mut self, transform: Matrix4<f32>) -> Result<(), FrameError> {
        self.calls.push(Call::ModelTransform(transform));
        Ok(())
    }

    fn set_material(&mut self, material: Option<&SharedMaterial>) -> Result<(), FrameError> {
        self.calls
            .push(Call::Material(material.map(|m| m.name.clone())));
        Ok(())
    }

    fn set_lights(&mut self, lights: &LightSet<'_>) -> Result<(), FrameError> {
        self.calls.push(Call::Lights {
            directional: lights.directional.is_some(),
            points: lights.points.len(),
            spots: lights.spots.len(),
        });
        Ok(())
    }

    fn draw(&mut self, mesh: &Mesh) -> Result<(), FrameError> {
        if self.failing_mesh.as_deref() == Some(mesh.name.as_str()) {
            return Err(FrameError::UnreadyMesh(mesh.name.clone()));
        }
        self.calls.push(Call::Draw(mesh.name.clone()));
        Ok(())
    }

    fn present(&mut self) -> Result<(), FrameError> {
        if self.fail_present {
            return Err(FrameError::Surface("lost"));
        }
        self.calls.push(Call::Present);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }
}

/// Headless platform for driving the real engine loop in tests.
#[derive(Default)]
pub struct FakePlatform {
    pub close_after: Option<u32>,
    pub script: Vec<Vec<InputEvent>>,
    pub fail_window: bool,
    pub fail_graphics: bool,
}

impl FakePlatform {
    pub fn closing_after(frames: u32) -> Self {
        Self {
            close_after: Some(frames),
            ..Default::default()
        }
    }

    pub fn with_script(mut self, script: Vec<Vec<InputEvent>>) -> Self {
        self.script = script;
        self
    }
}

impl Platform for FakePlatform {
    type Window = FakeWindow;
    type Shader = RecordingShader;

    fn create_window(&mut self, params: &WindowParams) -> Result<FakeWindow, InitError> {
        if self.fail_window {
            return Err(InitError::Window("no display".into()));
        }
        Ok(FakeWindow {
            params: params.clone(),
            polls: 0,
            close_after: self.close_after,
            script: std::mem::take(&mut self.script).into(),
            pending_close: false,
            cursor_hidden: false,
        })
    }

    fn init_graphics(
        &mut self,
        _window: &FakeWindow,
        _config: &EngineConfig,
        _runtime: &Runtime,
    ) -> Result<RecordingShader, InitError> {
        if self.fail_graphics {
            return Err(InitError::Graphics("no adapter".into()));
        }
        Ok(RecordingShader::default())
    }
}

/// An engine that is initialised and started with nothing in it.
pub fn running_engine(platform: FakePlatform) -> Engine<FakePlatform> {
    let mut engine = Engine::new(EngineConfig::default(), platform).unwrap();
    engine.initialize().unwrap();
    engine.start(|_| {}).unwrap();
    engine
}

pub fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
