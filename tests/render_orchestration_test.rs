use approx::assert_relative_eq;
use cgmath::{Matrix4, Vector3};
use ember_ngin::{
    data_structures::{
        light::{DirectionalLight, PointLight, SpotLight},
        material::Material,
        mesh::Mesh,
        model::Model,
        transform::Transform,
    },
    error::FrameError,
    render::draw_scene,
    scene::Scene,
};

use crate::common::test_utils::{Call, RecordingShader};

mod common;

fn two_slot_model() -> Model {
    let mut model = Model::with_material_slots("pair", 2);
    model.add_mesh(Mesh::quad("first").with_material_slot(1));
    model.add_mesh(Mesh::cube("second").with_material_slot(0));
    model
}

#[test]
fn frame_is_activated_once_and_presented_once() {
    let mut scene = Scene::default();
    scene.create_point_light(PointLight::default());
    scene.add_model(two_slot_model());
    let mut shader = RecordingShader::default();

    let stats = draw_scene(&mut shader, &scene).unwrap();
    assert_eq!(stats.draws, 2);
    assert_eq!(stats.skipped, 0);

    let lights = Call::Lights {
        directional: false,
        points: 1,
        spots: 0,
    };
    let identity = Matrix4::from_scale(1.0);
    assert_eq!(
        shader.calls,
        vec![
            Call::Activate,
            Call::World,
            Call::ModelTransform(identity),
            Call::Material(None),
            lights.clone(),
            Call::Draw("first".into()),
            Call::ModelTransform(identity),
            Call::Material(None),
            lights,
            Call::Draw("second".into()),
            Call::Present,
        ]
    );
}

#[test]
fn empty_scene_still_presents() {
    let scene = Scene::default();
    let mut shader = RecordingShader::default();

    let stats = draw_scene(&mut shader, &scene).unwrap();
    assert_eq!(stats.draws, 0);
    assert_eq!(shader.calls, vec![Call::Activate, Call::World, Call::Present]);
}

#[test]
fn models_draw_in_insertion_order() {
    let mut scene = Scene::default();
    for name in ["c", "a", "b"] {
        let mut model = Model::with_material_slots(name, 1);
        model.add_mesh(Mesh::quad(name));
        scene.add_model(model);
    }
    let mut shader = RecordingShader::default();

    draw_scene(&mut shader, &scene).unwrap();
    assert_eq!(shader.draws(), vec!["c", "a", "b"]);
}

#[test]
fn meshes_use_the_material_in_their_slot() {
    let mut model = two_slot_model();
    assert!(model.set_material_by_slot(0, Material::new("zero").shared()));
    assert!(model.set_material_by_slot(1, Material::new("one").shared()));
    let mut scene = Scene::default();
    scene.add_model(model);
    let mut shader = RecordingShader::default();

    draw_scene(&mut shader, &scene).unwrap();
    assert_eq!(
        shader.materials(),
        vec![Some("one".to_string()), Some("zero".to_string())]
    );
}

#[test]
fn out_of_range_slot_draws_with_the_defaults() {
    let mut model = Model::with_material_slots("short", 1);
    model.set_material(Material::new("only").shared());
    model.add_mesh(Mesh::quad("stray").with_material_slot(3));
    let mut scene = Scene::default();
    scene.add_model(model);
    let mut shader = RecordingShader::default();

    let stats = draw_scene(&mut shader, &scene).unwrap();
    assert_eq!(stats.draws, 1);
    assert_eq!(shader.materials(), vec![None]);
}

#[test]
fn assigning_an_out_of_range_slot_leaves_the_table_alone() {
    let mut model = Model::with_material_slots("short", 1);
    assert!(!model.set_material_by_slot(1, Material::new("late").shared()));
    assert_eq!(model.material_slot_count(), 1);
    assert!(model.material(0).is_none());
}

#[test]
fn mesh_transform_is_relative_to_its_model() {
    let mut model = Model::with_material_slots("offset", 1)
        .with_transform(Transform::from_position([1.0, 0.0, 0.0]));
    model.add_mesh(
        Mesh::quad("child")
            .with_relative_transform(Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0))),
    );
    let mut scene = Scene::default();
    scene.add_model(model);
    let mut shader = RecordingShader::default();

    draw_scene(&mut shader, &scene).unwrap();
    assert_relative_eq!(
        shader.model_transforms()[0],
        Matrix4::from_translation(Vector3::new(1.0, 2.0, 0.0))
    );
}

#[test]
fn light_counts_are_capped() {
    let mut scene = Scene::default();
    scene.create_dir_light(DirectionalLight::default());
    scene.create_dir_light(DirectionalLight::default());
    for _ in 0..25 {
        scene.create_point_light(PointLight::default());
        scene.create_spot_light(SpotLight::default());
    }
    let mut model = Model::with_material_slots("lit", 1);
    model.add_mesh(Mesh::quad("lit"));
    scene.add_model(model);
    let mut shader = RecordingShader::default();

    draw_scene(&mut shader, &scene).unwrap();
    assert!(shader.calls.contains(&Call::Lights {
        directional: true,
        points: 20,
        spots: 20,
    }));
}

#[test]
fn first_registered_lights_win_the_cap() {
    let mut scene = Scene::default();
    for i in 0..22 {
        scene.create_point_light(PointLight {
            intensity: i as f32,
            ..Default::default()
        });
    }

    let set = scene.light_set();
    assert_eq!(set.points.len(), 20);
    assert_eq!(set.points.first().unwrap().intensity, 0.0);
    assert_eq!(set.points.last().unwrap().intensity, 19.0);
}

#[test]
fn failed_draw_skips_only_that_mesh() {
    let mut scene = Scene::default();
    scene.add_model(two_slot_model());
    let mut shader = RecordingShader {
        failing_mesh: Some("first".into()),
        ..Default::default()
    };

    let stats = draw_scene(&mut shader, &scene).unwrap();
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(shader.draws(), vec!["second"]);
    assert_eq!(shader.frames(), 1);
}

#[test]
fn failed_present_is_returned() {
    let mut scene = Scene::default();
    scene.add_model(two_slot_model());
    let mut shader = RecordingShader {
        fail_present: true,
        ..Default::default()
    };

    assert!(matches!(
        draw_scene(&mut shader, &scene),
        Err(FrameError::Surface(_))
    ));
    assert_eq!(shader.draws().len(), 2);
}
