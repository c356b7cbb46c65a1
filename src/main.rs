use std::path::Path;

use anyhow::Context;
use cgmath::{InnerSpace, Vector3};
use ember_ngin::{
    Engine, GameObject, KeyCode, ObjectContext,
    config::EngineConfig,
    data_structures::{
        light::{DirectionalLight, PointLight, SpotLight},
        material::Material,
        mesh::Mesh,
        model::Model,
        transform::Transform,
    },
    platform::DesktopPlatform,
    scene::{LightId, ModelId, Stage},
};

const CONFIG_FILE: &str = "ember.toml";
const CRATE_MODEL: &str = "crate.obj";
const CRATE_MATERIALS: &str = "crate.mtl";
const CRATE_TEXTURE: &str = "crate.png";

/// Moves a point light around `centre` by a fixed angle every frame.
struct Orbit {
    light: LightId,
    centre: Vector3<f32>,
    radius: f32,
    height: f32,
    degrees_per_frame: f32,
    angle: f32,
}

impl GameObject for Orbit {
    fn on_tick(&mut self, ctx: &mut ObjectContext<'_>, _dt: f32) {
        self.angle = (self.angle + self.degrees_per_frame).rem_euclid(360.0);
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let position = self.centre + Vector3::new(cos * self.radius, self.height, sin * self.radius);
        if let Some(light) = ctx.scene_mut().point_light_mut(self.light) {
            light.position = position;
        }
    }
}

/// Swings a spotlight's intensity between `min` and `max`.
struct Pulse {
    light: LightId,
    min: f32,
    max: f32,
    speed: f32,
    elapsed: f32,
}

impl GameObject for Pulse {
    fn on_tick(&mut self, ctx: &mut ObjectContext<'_>, dt: f32) {
        self.elapsed += dt;
        let t = (self.elapsed * self.speed).sin() * 0.5 + 0.5;
        if let Some(light) = ctx.scene_mut().spot_light_mut(self.light) {
            light.intensity = self.min + (self.max - self.min) * t;
        }
    }
}

/// Keeps the flashlight at the camera, pointing where it looks.
struct FlashlightRig {
    light: LightId,
}

impl GameObject for FlashlightRig {
    fn on_tick(&mut self, ctx: &mut ObjectContext<'_>, _dt: f32) {
        let camera = ctx.stage().camera().transform;
        if let Some(light) = ctx.scene_mut().spot_light_mut(self.light) {
            light.position = camera.position;
            light.direction = camera.forward();
        }
    }
}

/// Spins the crate until its life time runs out.
struct Spinner {
    model: ModelId,
    degrees_per_second: f32,
}

impl GameObject for Spinner {
    fn on_start(&mut self, ctx: &mut ObjectContext<'_>) {
        log::info!("Spinner {} started, living for {}s", ctx.id(), ctx.life_time());
    }

    fn on_tick(&mut self, ctx: &mut ObjectContext<'_>, dt: f32) {
        if let Some(model) = ctx.scene_mut().model_mut(self.model) {
            model.transform.rotation.y += self.degrees_per_second * dt;
        }
    }

    fn on_post_tick(&mut self, ctx: &mut ObjectContext<'_>, _dt: f32) {
        if ctx.is_pending_destroy() {
            log::info!("Spinner {} is done", ctx.id());
        }
    }
}

fn load_config() -> anyhow::Result<EngineConfig> {
    if Path::new(CONFIG_FILE).exists() {
        EngineConfig::load(CONFIG_FILE).with_context(|| format!("could not load {CONFIG_FILE}"))
    } else {
        Ok(EngineConfig::default())
    }
}

fn add_crate(engine: &mut Engine<DesktopPlatform>) -> ModelId {
    if let Some(id) = engine.import_model(CRATE_MODEL) {
        let materials = engine.load_materials(CRATE_MATERIALS);
        if let Some(model) = engine.scene_mut().model_mut(id) {
            for (slot, material) in materials.into_iter().enumerate() {
                model.set_material_by_slot(slot, material);
            }
            model.transform = Transform::new().with_scale([10.0, 10.0, 10.0]);
        }
        return id;
    }

    log::warn!("Falling back to a procedural crate");
    let mut material = Material::new("crate");
    if let Some(texture) = engine.load_texture("crate", CRATE_TEXTURE) {
        material = material.with_base_colour(texture);
    }
    let mut model = Model::with_material_slots("crate", 1)
        .with_transform(Transform::new().with_scale([10.0, 10.0, 10.0]));
    model.add_mesh(Mesh::cube("crate"));
    model.set_material_by_slot(0, material.shared());
    engine.scene_mut().add_model(model)
}

fn add_floor(engine: &mut Engine<DesktopPlatform>) {
    let mut floor = Model::with_material_slots("floor", 1).with_transform(
        Transform::from_position([0.0, -5.0, 0.0]).with_scale([200.0, 1.0, 200.0]),
    );
    floor.add_mesh(Mesh::quad("floor"));
    let mut material = Material::new("floor");
    material.specular_strength = 0.1;
    floor.set_material_by_slot(0, material.shared());
    engine.scene_mut().add_model(floor);
}

/// F toggles the flashlight, 1-6 change its colour, I/O and J/K its inner and outer
/// cut-off and P/L its intensity.
fn bind_flashlight(engine: &mut Engine<DesktopPlatform>, light: LightId) {
    let mut enabled = true;
    let mut stored_intensity = 0.0;
    engine
        .input_mut()
        .on_key_press
        .bind(move |stage: &mut Stage, key: &KeyCode| {
            let Some(spot) = stage.scene.spot_light_mut(light) else {
                return;
            };
            let colour_step = match key {
                KeyCode::Digit1 => Some(Vector3::new(0.1, 0.0, 0.0)),
                KeyCode::Digit2 => Some(Vector3::new(-0.1, 0.0, 0.0)),
                KeyCode::Digit3 => Some(Vector3::new(0.0, 0.1, 0.0)),
                KeyCode::Digit4 => Some(Vector3::new(0.0, -0.1, 0.0)),
                KeyCode::Digit5 => Some(Vector3::new(0.0, 0.0, 0.1)),
                KeyCode::Digit6 => Some(Vector3::new(0.0, 0.0, -0.1)),
                _ => None,
            };
            if let Some(step) = colour_step {
                let c = spot.colour + step;
                spot.colour = Vector3::new(c.x.clamp(0.0, 1.0), c.y.clamp(0.0, 1.0), c.z.clamp(0.0, 1.0));
                return;
            }
            match key {
                KeyCode::KeyF => {
                    if enabled {
                        stored_intensity = spot.intensity;
                        spot.intensity = 0.0;
                    } else {
                        spot.intensity = stored_intensity;
                    }
                    enabled = !enabled;
                }
                KeyCode::KeyI => spot.set_inner_cut_off(spot.inner_cut_off_deg() + 1.0),
                KeyCode::KeyO => spot.set_inner_cut_off(spot.inner_cut_off_deg() - 1.0),
                KeyCode::KeyJ => spot.set_outer_cut_off(spot.outer_cut_off_deg() + 1.0),
                KeyCode::KeyK => spot.set_outer_cut_off(spot.outer_cut_off_deg() - 1.0),
                KeyCode::KeyP | KeyCode::KeyL => {
                    let step = if *key == KeyCode::KeyP { 0.1 } else { -0.1 };
                    let intensity = if enabled {
                        &mut spot.intensity
                    } else {
                        &mut stored_intensity
                    };
                    *intensity = (*intensity + step).max(0.0);
                }
                _ => {}
            }
        });
}

fn build_demo(engine: &mut Engine<DesktopPlatform>) {
    engine.scene_mut().camera.transform =
        Transform::from_position([0.0, 25.0, -75.0]).with_rotation([-15.0, 0.0, 0.0]);

    let crate_model = add_crate(engine);
    add_floor(engine);

    let scene = engine.scene_mut();
    scene.create_dir_light(DirectionalLight {
        direction: Vector3::new(-0.3, -1.0, 0.4).normalize(),
        intensity: 0.4,
        ambient: Vector3::new(0.05, 0.05, 0.05),
        ..Default::default()
    });
    let orbiting = scene.create_point_light(PointLight {
        colour: Vector3::new(1.0, 0.6, 0.3),
        intensity: 2.0,
        ..Default::default()
    });
    scene.create_point_light(PointLight {
        position: Vector3::new(-30.0, 10.0, 30.0),
        colour: Vector3::new(0.3, 0.5, 1.0),
        intensity: 1.5,
        ..Default::default()
    });

    let mut pulses = Vec::new();
    for (x, colour) in [(-25.0, Vector3::new(1.0, 0.2, 0.2)), (25.0, Vector3::new(0.2, 1.0, 0.2))] {
        let mut spot = SpotLight::default();
        spot.position = Vector3::new(x, 40.0, 0.0);
        spot.direction = Vector3::new(-x, -40.0, 0.0).normalize();
        spot.colour = colour;
        spot.intensity = 3.0;
        spot.set_inner_cut_off(12.0);
        spot.set_outer_cut_off(20.0);
        pulses.push(scene.create_spot_light(spot));
    }

    let mut flashlight = SpotLight::default();
    flashlight.intensity = 2.0;
    flashlight.set_inner_cut_off(10.0);
    flashlight.set_outer_cut_off(15.0);
    let flashlight = scene.create_spot_light(flashlight);

    engine.instantiate(Orbit {
        light: orbiting,
        centre: Vector3::new(0.0, 0.0, 0.0),
        radius: 25.0,
        height: 10.0,
        degrees_per_frame: -1.0,
        angle: 0.0,
    });
    for (i, light) in pulses.into_iter().enumerate() {
        engine.instantiate(Pulse {
            light,
            min: 0.5,
            max: 4.0,
            speed: 1.5 + i as f32,
            elapsed: 0.0,
        });
    }
    engine.instantiate(FlashlightRig { light: flashlight });
    bind_flashlight(engine, flashlight);

    engine.instantiate_with_life_time(
        Spinner {
            model: crate_model,
            degrees_per_second: 45.0,
        },
        5.0,
    );
}

fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let mut engine = Engine::new(config, DesktopPlatform).context("could not create the engine")?;
    engine.run(build_demo).context("engine failed to start")?;
    Ok(())
}
