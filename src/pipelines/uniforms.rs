//! GPU-side layouts of the per-frame and per-draw uniforms.
//!
//! Every member is a multiple of 16 bytes so the structs match WGSL's uniform layout
//! rules without hidden padding.

use cgmath::{Matrix, Matrix4, SquareMatrix};

use crate::{
    camera::Camera,
    data_structures::{
        light::{
            DirectionalLight, LightSet, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS, PointLight, SpotLight,
        },
        material::Material,
    },
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    /// rgb colour, intensity in w.
    pub colour: [f32; 4],
    pub ambient: [f32; 4],
    pub direction: [f32; 4],
}

impl From<&DirectionalLight> for DirectionalLightRaw {
    fn from(l: &DirectionalLight) -> Self {
        Self {
            colour: [l.colour.x, l.colour.y, l.colour.z, l.intensity],
            ambient: [l.ambient.x, l.ambient.y, l.ambient.z, 0.0],
            direction: [l.direction.x, l.direction.y, l.direction.z, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    pub position: [f32; 4],
    /// rgb colour, intensity in w.
    pub colour: [f32; 4],
    /// x linear, y quadratic.
    pub attenuation: [f32; 4],
}

impl From<&PointLight> for PointLightRaw {
    fn from(l: &PointLight) -> Self {
        Self {
            position: [l.position.x, l.position.y, l.position.z, 1.0],
            colour: [l.colour.x, l.colour.y, l.colour.z, l.intensity],
            attenuation: [l.linear, l.quadratic, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightRaw {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    /// rgb colour, intensity in w.
    pub colour: [f32; 4],
    /// linear, quadratic, cos(inner), cos(outer).
    pub params: [f32; 4],
}

impl From<&SpotLight> for SpotLightRaw {
    fn from(l: &SpotLight) -> Self {
        Self {
            position: [l.position.x, l.position.y, l.position.z, 1.0],
            direction: [l.direction.x, l.direction.y, l.direction.z, 0.0],
            colour: [l.colour.x, l.colour.y, l.colour.z, l.intensity],
            params: [l.linear, l.quadratic, l.inner_cut_off(), l.outer_cut_off()],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    pub directional: DirectionalLightRaw,
    /// directional, point and spot light counts.
    pub counts: [u32; 4],
    pub points: [PointLightRaw; MAX_POINT_LIGHTS],
    pub spots: [SpotLightRaw; MAX_SPOT_LIGHTS],
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            view_position: [0.0; 4],
            directional: DirectionalLightRaw::default(),
            counts: [0; 4],
            points: [PointLightRaw::default(); MAX_POINT_LIGHTS],
            spots: [SpotLightRaw::default(); MAX_SPOT_LIGHTS],
        }
    }
}

impl FrameUniform {
    pub fn set_camera(&mut self, camera: &Camera) {
        self.view_proj = camera.view_projection().into();
        let p = camera.transform.position;
        self.view_position = [p.x, p.y, p.z, 1.0];
    }

    pub fn set_lights(&mut self, lights: &LightSet<'_>) {
        self.directional = lights
            .directional
            .map(DirectionalLightRaw::from)
            .unwrap_or_default();
        self.points = [PointLightRaw::default(); MAX_POINT_LIGHTS];
        for (raw, light) in self.points.iter_mut().zip(&lights.points) {
            *raw = PointLightRaw::from(*light);
        }
        self.spots = [SpotLightRaw::default(); MAX_SPOT_LIGHTS];
        for (raw, light) in self.spots.iter_mut().zip(&lights.spots) {
            *raw = SpotLightRaw::from(*light);
        }
        self.counts = [
            lights.directional.is_some() as u32,
            lights.points.len().min(MAX_POINT_LIGHTS) as u32,
            lights.spots.len().min(MAX_SPOT_LIGHTS) as u32,
            0,
        ];
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals and tangents.
    pub normal: [[f32; 4]; 4],
    /// shininess, specular strength, has specular map, has normal map.
    pub material: [f32; 4],
}

impl Default for DrawUniform {
    fn default() -> Self {
        Self {
            model: Matrix4::identity().into(),
            normal: Matrix4::identity().into(),
            material: [32.0, 0.5, 0.0, 0.0],
        }
    }
}

impl DrawUniform {
    pub fn set_transform(&mut self, model: Matrix4<f32>) {
        self.model = model.into();
        let normal = model
            .invert()
            .map(|m| m.transpose())
            .unwrap_or_else(Matrix4::identity);
        self.normal = normal.into();
    }

    pub fn set_material(&mut self, material: Option<&Material>) {
        let defaults = Material::default();
        let material = material.unwrap_or(&defaults);
        self.material = [
            material.shininess,
            material.specular_strength,
            material.specular_map.is_some() as u32 as f32,
            material.normal_map.is_some() as u32 as f32,
        ];
    }
}

/// Rounds `size` up to the next multiple of `alignment`.
pub fn align_to(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::data_structures::light::Light;

    #[test]
    fn structs_have_no_hidden_padding() {
        assert_eq!(std::mem::size_of::<DirectionalLightRaw>(), 48);
        assert_eq!(std::mem::size_of::<PointLightRaw>(), 48);
        assert_eq!(std::mem::size_of::<SpotLightRaw>(), 64);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 144);
        assert_eq!(
            std::mem::size_of::<FrameUniform>(),
            64 + 16 + 48 + 16 + 48 * MAX_POINT_LIGHTS + 64 * MAX_SPOT_LIGHTS
        );
    }

    #[test]
    fn lights_are_packed_in_order_with_counts() {
        let mut spot = SpotLight::default();
        spot.set_outer_cut_off(60.0);
        let lights = vec![
            Light::Point(PointLight {
                position: Vector3::new(1.0, 2.0, 3.0),
                ..Default::default()
            }),
            Light::Spot(spot),
            Light::Point(PointLight {
                intensity: 4.0,
                ..Default::default()
            }),
        ];
        let mut frame = FrameUniform::default();
        frame.set_lights(&LightSet::collect(&lights));

        assert_eq!(frame.counts, [0, 2, 1, 0]);
        assert_eq!(frame.points[0].position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(frame.points[1].colour[3], 4.0);
        assert!((frame.spots[0].params[3] - 0.5).abs() < 1e-6);
        assert_eq!(frame.points[2], PointLightRaw::default());
    }

    #[test]
    fn material_flags_track_maps() {
        let mut draw = DrawUniform::default();
        draw.set_material(None);
        assert_eq!(draw.material, [32.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn alignment_rounds_up() {
        assert_eq!(align_to(144, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }
}
