//! Scene contents and the mutable stage handed to game code.
//!
//! # Key types
//!
//! - [`Scene`] owns the camera, the light list and the model list, both kept in
//!   insertion order and addressed through stable handles
//! - [`Stage`] wraps the scene together with the camera-control accumulators and the
//!   requests game code makes to the window (close, cursor visibility)

use cgmath::{Vector3, Zero};

use crate::{
    camera::Camera,
    data_structures::{
        light::{DirectionalLight, Light, LightSet, PointLight, SpotLight},
        model::Model,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LightId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelId(u32);

#[derive(Debug, Default)]
pub struct Scene {
    pub camera: Camera,
    lights: Vec<(LightId, Light)>,
    models: Vec<(ModelId, Model)>,
    next_light: u32,
    next_model: u32,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            ..Default::default()
        }
    }

    pub fn add_light(&mut self, light: impl Into<Light>) -> LightId {
        self.next_light += 1;
        let id = LightId(self.next_light);
        self.lights.push((id, light.into()));
        id
    }

    pub fn create_dir_light(&mut self, light: DirectionalLight) -> LightId {
        self.add_light(light)
    }

    pub fn create_point_light(&mut self, light: PointLight) -> LightId {
        self.add_light(light)
    }

    pub fn create_spot_light(&mut self, light: SpotLight) -> LightId {
        self.add_light(light)
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.iter().find(|(l, _)| *l == id).map(|(_, light)| light)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights
            .iter_mut()
            .find(|(l, _)| *l == id)
            .map(|(_, light)| light)
    }

    pub fn spot_light_mut(&mut self, id: LightId) -> Option<&mut SpotLight> {
        self.light_mut(id).and_then(Light::as_spot_mut)
    }

    pub fn point_light_mut(&mut self, id: LightId) -> Option<&mut PointLight> {
        self.light_mut(id).and_then(Light::as_point_mut)
    }

    pub fn remove_light(&mut self, id: LightId) -> Option<Light> {
        let index = self.lights.iter().position(|(l, _)| *l == id)?;
        Some(self.lights.remove(index).1)
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter().map(|(_, light)| light)
    }

    /// The capped set of lights a shader receives this frame.
    pub fn light_set(&self) -> LightSet<'_> {
        LightSet::collect(self.lights())
    }

    pub fn add_model(&mut self, model: Model) -> ModelId {
        for mesh in model.out_of_range_meshes() {
            log::warn!(
                "Mesh {:?} uses material slot {} but model {:?} only has {}; drawing it with the default material",
                mesh.name,
                mesh.material_slot,
                model.name,
                model.material_slot_count()
            );
        }
        self.next_model += 1;
        let id = ModelId(self.next_model);
        self.models.push((id, model));
        id
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.iter().find(|(m, _)| *m == id).map(|(_, model)| model)
    }

    pub fn model_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models
            .iter_mut()
            .find(|(m, _)| *m == id)
            .map(|(_, model)| model)
    }

    pub fn remove_model(&mut self, id: ModelId) -> Option<Model> {
        let index = self.models.iter().position(|(m, _)| *m == id)?;
        Some(self.models.remove(index).1)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter().map(|(_, model)| model)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }
}

/// Accumulators written by input callbacks and consumed once per frame before
/// rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraControls {
    /// Movement along the camera axes: `z` forward, `x` right, `y` up.
    pub direction: Vector3<f32>,
    /// Rotation in degrees for this frame, `x` pitch and `y` yaw.
    pub rotation: Vector3<f32>,
    pub can_zoom: bool,
    /// While set the cursor belongs to the user and the camera stays put.
    pub input_mode: bool,
}

impl Default for CameraControls {
    fn default() -> Self {
        Self {
            direction: Vector3::zero(),
            rotation: Vector3::zero(),
            can_zoom: false,
            input_mode: false,
        }
    }
}

/// Changes to the window requested during a frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowRequests {
    pub close: bool,
    pub show_cursor: Option<bool>,
}

#[derive(Debug, Default)]
pub struct Stage {
    pub scene: Scene,
    pub controls: CameraControls,
    requests: WindowRequests,
    cursor_hidden: bool,
}

impl Stage {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            ..Default::default()
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.scene.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.scene.camera
    }

    pub fn request_close(&mut self) {
        self.requests.close = true;
    }

    /// Shows or captures the cursor. The window applies the change after the input
    /// phase; [`is_cursor_hidden`](Self::is_cursor_hidden) reflects it right away.
    pub fn show_cursor(&mut self, show: bool) {
        self.cursor_hidden = !show;
        self.requests.show_cursor = Some(show);
    }

    pub fn is_cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    pub(crate) fn sync_cursor(&mut self, hidden: bool) {
        self.cursor_hidden = hidden;
    }

    pub fn take_requests(&mut self) -> WindowRequests {
        std::mem::take(&mut self.requests)
    }

    /// Moves and turns the camera by this frame's accumulated input.
    pub fn apply_camera_controls(&mut self) {
        if self.controls.input_mode {
            return;
        }
        let controls = &self.controls;
        let camera = &mut self.scene.camera;
        camera.translate(controls.direction, Vector3::new(1.0, 1.0, 1.0));
        let rotation = controls.rotation;
        camera.rotate(rotation, rotation.map(f32::abs));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn handles_stay_valid_after_removal() {
        let mut scene = Scene::default();
        let a = scene.add_model(Model::new("a"));
        let b = scene.add_model(Model::new("b"));
        let c = scene.add_model(Model::new("c"));
        assert!(scene.remove_model(b).is_some());
        assert!(scene.remove_model(b).is_none());
        assert_eq!(scene.model(a).unwrap().name, "a");
        assert_eq!(scene.model(c).unwrap().name, "c");
        let names: Vec<_> = scene.models().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn lights_keep_insertion_order() {
        let mut scene = Scene::default();
        scene.create_point_light(PointLight::default());
        let spot = scene.create_spot_light(SpotLight::default());
        scene.create_dir_light(DirectionalLight::default());
        let kinds: Vec<_> = scene
            .lights()
            .map(|l| match l {
                Light::Directional(_) => "dir",
                Light::Point(_) => "point",
                Light::Spot(_) => "spot",
            })
            .collect();
        assert_eq!(kinds, vec!["point", "spot", "dir"]);
        scene.spot_light_mut(spot).unwrap().set_inner_cut_off(20.0);
        assert!(scene.point_light_mut(spot).is_none());
        assert_eq!(scene.light_set().len(), 3);
    }

    #[test]
    fn controls_move_camera_unless_in_input_mode() {
        let mut stage = Stage::default();
        stage.controls.direction = Vector3::new(0.0, 0.0, 1.0);
        stage.controls.rotation = Vector3::new(0.0, -4.0, 0.0);
        stage.apply_camera_controls();
        assert_relative_eq!(stage.camera().transform.position, Vector3::new(0.0, 0.0, 0.1));
        assert_relative_eq!(stage.camera().transform.rotation.y, -4.0);

        stage.controls.input_mode = true;
        stage.apply_camera_controls();
        assert_relative_eq!(stage.camera().transform.position, Vector3::new(0.0, 0.0, 0.1));
    }

    #[test]
    fn cursor_requests_are_taken_once() {
        let mut stage = Stage::default();
        stage.show_cursor(false);
        assert!(stage.is_cursor_hidden());
        stage.request_close();
        let requests = stage.take_requests();
        assert!(requests.close);
        assert_eq!(requests.show_cursor, Some(false));
        assert_eq!(stage.take_requests(), WindowRequests::default());
    }
}
