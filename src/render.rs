//! Per-frame draw orchestration.
//!
//! [`draw_scene`] walks the scene in insertion order and drives a [`ShaderProgram`]:
//! the program is activated and given the camera once, then every mesh of every model
//! gets its world transform, material and the capped light set pushed before its draw
//! call. The frame is presented once at the end. Nothing is sorted by depth.
//!
//! A failing draw is logged and skipped; the rest of the frame still renders. Only a
//! failure to activate the program or to present aborts the frame, and the engine
//! logs that and carries on with the next one.

use cgmath::Matrix4;

use crate::{
    camera::Camera,
    data_structures::{light::LightSet, material::SharedMaterial, mesh::Mesh, model::Model},
    error::FrameError,
    scene::Scene,
};

/// The uniform-binding and draw-call surface a renderer exposes to the orchestrator.
#[allow(unused_variables)]
pub trait ShaderProgram {
    fn activate(&mut self) -> Result<(), FrameError>;

    /// View and projection for the frame.
    fn set_world_transform(&mut self, camera: &Camera) -> Result<(), FrameError>;

    /// Mesh to world transform for the next draw.
    fn set_model_transform(&mut self, transform: Matrix4<f32>) -> Result<(), FrameError>;

    /// Material for the next draw; `None` binds the default maps.
    fn set_material(&mut self, material: Option<&SharedMaterial>) -> Result<(), FrameError>;

    fn set_lights(&mut self, lights: &LightSet<'_>) -> Result<(), FrameError>;

    fn draw(&mut self, mesh: &Mesh) -> Result<(), FrameError>;

    fn present(&mut self) -> Result<(), FrameError>;

    fn resize(&mut self, width: u32, height: u32) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: usize,
    pub skipped: usize,
}

/// Renders one complete frame of `scene` through `shader`.
pub fn draw_scene<S: ShaderProgram + ?Sized>(
    shader: &mut S,
    scene: &Scene,
) -> Result<FrameStats, FrameError> {
    let mut stats = FrameStats::default();

    shader.activate()?;
    shader.set_world_transform(&scene.camera)?;

    let lights = scene.light_set();
    for model in scene.models() {
        let model_matrix = model.transform.to_matrix();
        for mesh in model.meshes() {
            match draw_mesh(shader, model, mesh, model_matrix, &lights) {
                Ok(()) => stats.draws += 1,
                Err(e) => {
                    log::error!(
                        "Skipping mesh {:?} of model {:?}: {}",
                        mesh.name,
                        model.name,
                        e
                    );
                    stats.skipped += 1;
                }
            }
        }
    }

    shader.present()?;
    Ok(stats)
}

fn draw_mesh<S: ShaderProgram + ?Sized>(
    shader: &mut S,
    model: &Model,
    mesh: &Mesh,
    model_matrix: Matrix4<f32>,
    lights: &LightSet<'_>,
) -> Result<(), FrameError> {
    let material = resolve_material(model, mesh);
    shader.set_model_transform(model_matrix * mesh.relative_transform)?;
    shader.set_material(material)?;
    shader.set_lights(lights)?;
    shader.draw(mesh)
}

/// Looks up the mesh's slot in the model's material table.
///
/// A slot past the end of the table is a configuration error, reported once when the
/// model is added to the scene; the mesh is drawn with the default material.
pub fn resolve_material<'m>(model: &'m Model, mesh: &Mesh) -> Option<&'m SharedMaterial> {
    if mesh.material_slot >= model.material_slot_count() {
        log::debug!(
            "Mesh {:?} uses material slot {} but model {:?} only has {}",
            mesh.name,
            mesh.material_slot,
            model.name,
            model.material_slot_count()
        );
        return None;
    }
    model.material(mesh.material_slot)
}
