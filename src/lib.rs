//! ember-ngin
//!
//! A small forward-rendering 3D engine built around a deferred game-object
//! lifecycle. Game code implements [`object::GameObject`], hands objects to the
//! [`flow::Engine`] and mutates the [`scene::Scene`] from hooks and input callbacks;
//! the engine runs the fixed per-frame phase sequence and draws the scene through a
//! [`render::ShaderProgram`].
//!
//! High-level modules
//! - `camera`: free-fly perspective camera
//! - `config`: TOML engine configuration
//! - `context`: wgpu device, queue and window surface
//! - `data_structures`: transforms, lights, materials, textures, meshes and models
//! - `events`: callback registry with reusable listener ids
//! - `flow`: the engine state machine and frame loop
//! - `input`: input events, their registries and the default camera controls
//! - `object`: game objects and their deferred instantiation and destruction
//! - `pipelines`: the wgpu forward renderer and its uniform layouts
//! - `platform`: window and graphics construction
//! - `render`: per-frame draw orchestration
//! - `resources`: glTF/OBJ import and texture loading
//! - `scene`: lights, models and the stage handed to game code
//! - `window`: the winit window and its event pump
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod events;
pub mod flow;
pub mod input;
pub mod object;
pub mod pipelines;
pub mod platform;
pub mod render;
pub mod resources;
pub mod scene;
pub mod window;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit;
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

pub use flow::{Engine, EngineState};
pub use object::{GameObject, ObjectContext, ObjectId};
