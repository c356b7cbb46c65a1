//! Surface description shared between meshes.

use std::rc::Rc;

use crate::data_structures::texture::SharedTexture;

/// Materials are shared by reference; the last holder releases them and their
/// textures.
pub type SharedMaterial = Rc<Material>;

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub base_colour_map: Option<SharedTexture>,
    pub specular_map: Option<SharedTexture>,
    pub normal_map: Option<SharedTexture>,
    pub shininess: f32,
    pub specular_strength: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default")
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_colour_map: None,
            specular_map: None,
            normal_map: None,
            shininess: 32.0,
            specular_strength: 0.5,
        }
    }

    pub fn with_base_colour(mut self, texture: SharedTexture) -> Self {
        self.base_colour_map = Some(texture);
        self
    }

    pub fn with_specular(mut self, texture: SharedTexture) -> Self {
        self.specular_map = Some(texture);
        self
    }

    pub fn with_normal(mut self, texture: SharedTexture) -> Self {
        self.normal_map = Some(texture);
        self
    }

    pub fn shared(self) -> SharedMaterial {
        Rc::new(self)
    }
}
