//! The engine and its frame loop.
//!
//! [`Engine`] owns the window, the shader program, the [`Stage`] and every game
//! object. Each frame runs the same phases in a fixed order:
//!
//! 1. pre-phase: pending objects are started and become live
//! 2. input phase: window events are polled and dispatched to the input callbacks
//! 3. tick phase: live objects are ticked and post-ticked
//! 4. render phase: camera controls are applied and the scene is drawn
//! 5. post-phase: objects destroyed during the frame are removed
//!
//! Only initialisation can fail; anything going wrong inside a frame is logged and the
//! loop carries on.
//!
//! # Lifecycle
//!
//! `Uninitialized → Initialized → Running → ShuttingDown → Terminated`.
//! [`Engine::run`] walks through all of them; tests drive the same steps one at a
//! time with [`Engine::initialize`], [`Engine::start`], [`Engine::step`] and
//! [`Engine::shutdown`].

use std::{future::Future, path::Path, rc::Rc};

use instant::Instant;
use tokio::runtime::Runtime;

use crate::{
    config::EngineConfig,
    data_structures::{material::SharedMaterial, texture::SharedTexture},
    error::InitError,
    input::{CameraBindings, Input, InputEvent, register_camera_controls},
    object::{GameObject, ObjectId, ObjectRegistry},
    platform::Platform,
    render::{ShaderProgram, draw_scene},
    resources,
    scene::{ModelId, Scene, Stage},
    window::Window,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
    Running,
    ShuttingDown,
    Terminated,
}

pub struct Engine<P: Platform> {
    config: EngineConfig,
    platform: P,
    runtime: Runtime,
    state: EngineState,
    window: Option<P::Window>,
    shader: Option<P::Shader>,
    stage: Stage,
    objects: ObjectRegistry,
    input: Input<Stage>,
    camera_bindings: Option<CameraBindings>,
    events: Vec<InputEvent>,
    delta_time: f32,
    frame_count: u64,
}

impl<P: Platform> Engine<P> {
    pub fn new(config: EngineConfig, platform: P) -> Result<Self, InitError> {
        let runtime = Runtime::new()?;
        Ok(Self {
            config,
            platform,
            runtime,
            state: EngineState::Uninitialized,
            window: None,
            shader: None,
            stage: Stage::default(),
            objects: ObjectRegistry::new(),
            input: Input::new(),
            camera_bindings: None,
            events: Vec::new(),
            delta_time: 0.0,
            frame_count: 0,
        })
    }

    fn expect_state(&self, expected: EngineState) -> Result<(), InitError> {
        if self.state != expected {
            return Err(InitError::InvalidState {
                expected,
                found: self.state,
            });
        }
        Ok(())
    }

    /// Opens the window and creates the graphics context.
    ///
    /// On failure everything acquired so far is released and the engine stays
    /// uninitialised.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        self.expect_state(EngineState::Uninitialized)?;

        let window = self.platform.create_window(&self.config.window)?;
        let shader = self
            .platform
            .init_graphics(&window, &self.config, &self.runtime)?;

        self.stage.camera_mut().aspect = window.aspect_ratio();
        self.stage.sync_cursor(window.is_cursor_hidden());
        self.window = Some(window);
        self.shader = Some(shader);
        self.state = EngineState::Initialized;
        log::info!("Engine initialised");
        Ok(())
    }

    /// Binds the camera controls, captures the cursor and runs `on_start` once.
    pub fn start(&mut self, on_start: impl FnOnce(&mut Self)) -> Result<(), InitError> {
        self.expect_state(EngineState::Initialized)?;
        self.camera_bindings = Some(register_camera_controls(&mut self.input));
        self.stage.show_cursor(false);
        on_start(self);
        self.state = EngineState::Running;
        Ok(())
    }

    /// Runs the whole lifecycle: initialise, start, loop until the window closes, shut
    /// down.
    pub fn run(&mut self, on_start: impl FnOnce(&mut Self)) -> Result<(), InitError> {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }

        if self.state == EngineState::Uninitialized {
            self.initialize()?;
        }
        self.start(on_start)?;

        let mut last_time: Option<Instant> = None;
        while !self.is_pending_close() {
            let now = Instant::now();
            let dt = last_time
                .map(|last| now.duration_since(last).as_secs_f32())
                .unwrap_or(0.0);
            last_time = Some(now);
            self.step(dt);
        }

        self.shutdown();
        Ok(())
    }

    /// Runs one frame with a time step of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if self.state != EngineState::Running {
            log::warn!("Ignoring frame while the engine is {:?}", self.state);
            return;
        }
        self.delta_time = dt;
        self.frame_count += 1;

        self.objects.pre_loop(&mut self.stage);
        self.input_phase();
        self.objects.tick(&mut self.stage, dt);
        self.render_phase();
        self.objects.post_loop();
    }

    fn input_phase(&mut self) {
        self.apply_window_requests();
        let (Some(window), Some(shader)) = (self.window.as_mut(), self.shader.as_mut()) else {
            return;
        };

        self.events.clear();
        window.poll_events(&mut self.events);
        for event in &self.events {
            match *event {
                InputEvent::CloseRequested => window.close(),
                InputEvent::Resized(width, height) => {
                    shader.resize(width, height);
                    if width > 0 && height > 0 {
                        self.stage.camera_mut().aspect = width as f32 / height as f32;
                    }
                }
                _ => {}
            }
        }
        self.stage.sync_cursor(window.is_cursor_hidden());
        self.input.dispatch(&mut self.stage, &self.events);
        self.apply_window_requests();
    }

    fn apply_window_requests(&mut self) {
        let requests = self.stage.take_requests();
        let Some(window) = self.window.as_mut() else {
            return;
        };
        if let Some(show) = requests.show_cursor {
            window.show_cursor(show);
        }
        if requests.close {
            window.close();
        }
        self.stage.sync_cursor(window.is_cursor_hidden());
    }

    fn render_phase(&mut self) {
        self.stage.apply_camera_controls();
        let Some(shader) = self.shader.as_mut() else {
            return;
        };
        match draw_scene(shader, &self.stage.scene) {
            Ok(stats) if stats.skipped > 0 => log::debug!(
                "Frame {}: {} draws, {} skipped",
                self.frame_count,
                stats.draws,
                stats.skipped
            ),
            Ok(_) => {}
            Err(e) => log::error!("Frame {} was not rendered: {}", self.frame_count, e),
        }
    }

    /// Drops every object and releases the collaborators in reverse order of
    /// acquisition.
    pub fn shutdown(&mut self) {
        if matches!(
            self.state,
            EngineState::ShuttingDown | EngineState::Terminated
        ) {
            return;
        }
        self.state = EngineState::ShuttingDown;
        self.objects.clear();
        self.input.clear();
        self.camera_bindings = None;
        self.shader = None;
        self.window = None;
        self.state = EngineState::Terminated;
        log::info!("Engine shut down after {} frames", self.frame_count);
    }

    pub fn is_pending_close(&self) -> bool {
        self.window.as_ref().is_none_or(|w| w.is_pending_close())
    }

    /// Asks the window to close; the loop ends after the current frame.
    pub fn close(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.close();
        }
    }

    /// Queues `object` to start in the next pre-phase.
    pub fn instantiate(&mut self, object: impl GameObject) -> ObjectId {
        self.objects.instantiate(object)
    }

    /// Queues `object` to start in the next pre-phase and be destroyed after
    /// `seconds` of ticking.
    pub fn instantiate_with_life_time(&mut self, object: impl GameObject, seconds: f32) -> ObjectId {
        self.objects.instantiate_with_life_time(object, seconds)
    }

    /// Queues `id` for removal at the end of the current frame.
    pub fn destroy(&mut self, id: ObjectId) {
        self.objects.destroy(id);
    }

    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.objects.contains(id)
    }

    pub fn is_pending_destroy(&self, id: ObjectId) -> bool {
        self.objects.is_pending_destroy(id)
    }

    pub fn is_pending_instantiation(&self, id: ObjectId) -> bool {
        self.objects.is_pending_instantiation(id)
    }

    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    pub fn scene(&self) -> &Scene {
        &self.stage.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.stage.scene
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Registries for binding extra input callbacks.
    pub fn input_mut(&mut self) -> &mut Input<Stage> {
        &mut self.input
    }

    pub fn camera_bindings(&self) -> Option<&CameraBindings> {
        self.camera_bindings.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn window(&self) -> Option<&P::Window> {
        self.window.as_ref()
    }

    pub fn shader(&self) -> Option<&P::Shader> {
        self.shader.as_ref()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Time step of the current frame in seconds.
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Runs a future to completion on the engine's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Imports a model relative to the asset root and adds it to the scene.
    ///
    /// A failed import is logged and leaves the scene untouched.
    pub fn import_model(&mut self, path: impl AsRef<Path>) -> Option<ModelId> {
        let path = self.config.asset_path(path);
        match self.runtime.block_on(resources::import_model(&path)) {
            Ok(model) => {
                log::info!(
                    "Imported {} with {} meshes and {} material slots",
                    path.display(),
                    model.meshes().len(),
                    model.material_slot_count()
                );
                Some(self.stage.scene.add_model(model))
            }
            Err(e) => {
                log::warn!("Could not import {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Loads a texture relative to the asset root. Failures are logged.
    pub fn load_texture(&self, name: &str, path: impl AsRef<Path>) -> Option<SharedTexture> {
        let path = self.config.asset_path(path);
        match self.runtime.block_on(resources::load_texture(name, &path)) {
            Ok(texture) => Some(Rc::new(texture)),
            Err(e) => {
                log::warn!("Could not load texture {:?}: {}", name, e);
                None
            }
        }
    }

    /// Loads the materials of a Wavefront material library relative to the asset root,
    /// in library order. Failures are logged and yield no materials.
    pub fn load_materials(&self, path: impl AsRef<Path>) -> Vec<SharedMaterial> {
        let path = self.config.asset_path(path);
        match self.runtime.block_on(resources::load_mtl_materials(&path)) {
            Ok(materials) => materials.into_iter().map(Rc::new).collect(),
            Err(e) => {
                log::warn!("Could not load materials from {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}
