//! Models: an ordered set of meshes, a world transform and a material table.
//!
//! Meshes pick their material through a slot index into the model's table, so all
//! meshes sharing a slot are re-skinned by assigning a single entry.

use crate::data_structures::{
    material::SharedMaterial, mesh::Mesh, transform::Transform,
};

#[derive(Debug, Default)]
pub struct Model {
    pub name: String,
    pub transform: Transform,
    meshes: Vec<Mesh>,
    materials: Vec<Option<SharedMaterial>>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// A model whose material table starts with `slots` unassigned entries.
    pub fn with_material_slots(name: &str, slots: usize) -> Self {
        Self {
            name: name.to_string(),
            materials: vec![None; slots],
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn add_mesh(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn material_slot_count(&self) -> usize {
        self.materials.len()
    }

    /// Meshes whose material slot lies past the end of the table.
    pub fn out_of_range_meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes
            .iter()
            .filter(|mesh| mesh.material_slot >= self.materials.len())
    }

    /// Grows the material table to `slots` entries. Existing assignments are kept.
    pub fn resize_material_slots(&mut self, slots: usize) {
        if slots > self.materials.len() {
            self.materials.resize(slots, None);
        }
    }

    /// The material assigned to `slot`, if the slot exists and is assigned.
    pub fn material(&self, slot: usize) -> Option<&SharedMaterial> {
        self.materials.get(slot).and_then(Option::as_ref)
    }

    /// Assigns `material` to `slot`.
    ///
    /// An out-of-range slot is a configuration error: it is logged and the table is
    /// left unchanged. Returns whether the assignment happened.
    pub fn set_material_by_slot(&mut self, slot: usize, material: SharedMaterial) -> bool {
        match self.materials.get_mut(slot) {
            Some(entry) => {
                *entry = Some(material);
                true
            }
            None => {
                log::warn!(
                    "Material slot {} is out of range for model {:?} with {} slots",
                    slot,
                    self.name,
                    self.materials.len()
                );
                false
            }
        }
    }

    /// Assigns `material` to every slot of the table.
    pub fn set_material(&mut self, material: SharedMaterial) {
        for entry in &mut self.materials {
            *entry = Some(material.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::data_structures::material::Material;

    #[test]
    fn slot_table_starts_unassigned() {
        let model = Model::with_material_slots("house", 3);
        assert_eq!(model.material_slot_count(), 3);
        assert!((0..3).all(|slot| model.material(slot).is_none()));
        assert!(model.material(3).is_none());
    }

    #[test]
    fn in_range_assignment_touches_exactly_one_slot() {
        let mut model = Model::with_material_slots("house", 3);
        let brick = Material::new("brick").shared();
        assert!(model.set_material_by_slot(1, brick.clone()));
        assert!(model.material(0).is_none());
        assert!(Rc::ptr_eq(model.material(1).unwrap(), &brick));
        assert!(model.material(2).is_none());
    }

    #[test]
    fn out_of_range_assignment_is_ignored() {
        let mut model = Model::with_material_slots("house", 2);
        let brick = Material::new("brick").shared();
        assert!(!model.set_material_by_slot(2, brick.clone()));
        assert_eq!(model.material_slot_count(), 2);
        assert!(model.material(0).is_none() && model.material(1).is_none());
        assert_eq!(Rc::strong_count(&brick), 1);
    }

    #[test]
    fn set_material_shares_one_reference() {
        let mut model = Model::with_material_slots("crate", 2);
        let wood = Material::new("wood").shared();
        model.set_material(wood.clone());
        assert_eq!(Rc::strong_count(&wood), 3);
        drop(model);
        assert_eq!(Rc::strong_count(&wood), 1);
    }

    #[test]
    fn meshes_past_the_table_are_listed() {
        let mut model = Model::with_material_slots("crate", 2);
        model.add_mesh(Mesh::quad("lid").with_material_slot(1));
        model.add_mesh(Mesh::quad("side").with_material_slot(2));
        model.add_mesh(Mesh::quad("base").with_material_slot(7));
        let names: Vec<_> = model.out_of_range_meshes().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["side", "base"]);

        model.resize_material_slots(8);
        assert_eq!(model.out_of_range_meshes().count(), 0);
    }

    #[test]
    fn resize_keeps_assignments() {
        let mut model = Model::with_material_slots("crate", 1);
        model.set_material_by_slot(0, Material::default().shared());
        model.resize_material_slots(3);
        assert_eq!(model.material_slot_count(), 3);
        assert!(model.material(0).is_some());
        model.resize_material_slots(1);
        assert_eq!(model.material_slot_count(), 3);
    }
}
