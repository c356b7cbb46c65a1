//! Light records consumed by the renderer.
//!
//! # Key types
//!
//! - [`Light`] is the tagged variant over the three light kinds
//! - [`SpotLight`] keeps its cone angles in degrees together with the cached cosines
//! - [`LightSet`] is the capped per-frame view handed to a shader

use cgmath::Vector3;

pub const MAX_DIR_LIGHTS: usize = 1;
pub const MAX_POINT_LIGHTS: usize = 20;
pub const MAX_SPOT_LIGHTS: usize = 20;

#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub colour: Vector3<f32>,
    pub intensity: f32,
    pub ambient: Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            colour: Vector3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            ambient: Vector3::new(0.01, 0.01, 0.01),
            direction: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub colour: Vector3<f32>,
    pub intensity: f32,
    pub position: Vector3<f32>,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            colour: Vector3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            position: Vector3::new(0.0, 0.0, 0.0),
            linear: 0.045,
            quadratic: 0.0075,
        }
    }
}

/// A cone light.
///
/// The cut-off angles are private so the cosines the shader compares against can
/// never drift from the angles they were derived from.
#[derive(Clone, Debug, PartialEq)]
pub struct SpotLight {
    pub colour: Vector3<f32>,
    pub intensity: f32,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub linear: f32,
    pub quadratic: f32,
    inner_cut_off_deg: f32,
    outer_cut_off_deg: f32,
    inner_cut_off: f32,
    outer_cut_off: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        let mut light = Self {
            colour: Vector3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            position: Vector3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(0.0, 0.0, 1.0),
            linear: 0.014,
            quadratic: 0.0007,
            inner_cut_off_deg: 0.0,
            outer_cut_off_deg: 0.0,
            inner_cut_off: 1.0,
            outer_cut_off: 1.0,
        };
        light.set_inner_cut_off(8.75);
        light.set_outer_cut_off(17.5);
        light
    }
}

impl SpotLight {
    pub fn inner_cut_off_deg(&self) -> f32 {
        self.inner_cut_off_deg
    }

    pub fn outer_cut_off_deg(&self) -> f32 {
        self.outer_cut_off_deg
    }

    /// Cosine of the inner cone half-angle.
    pub fn inner_cut_off(&self) -> f32 {
        self.inner_cut_off
    }

    /// Cosine of the outer cone half-angle.
    pub fn outer_cut_off(&self) -> f32 {
        self.outer_cut_off
    }

    pub fn set_inner_cut_off(&mut self, degrees: f32) {
        self.inner_cut_off_deg = degrees;
        self.inner_cut_off = degrees.to_radians().cos();
    }

    pub fn set_outer_cut_off(&mut self, degrees: f32) {
        self.outer_cut_off_deg = degrees;
        self.outer_cut_off = degrees.to_radians().cos();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    pub fn colour(&self) -> Vector3<f32> {
        match self {
            Light::Directional(l) => l.colour,
            Light::Point(l) => l.colour,
            Light::Spot(l) => l.colour,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Directional(l) => l.intensity,
            Light::Point(l) => l.intensity,
            Light::Spot(l) => l.intensity,
        }
    }

    pub fn set_colour(&mut self, colour: Vector3<f32>) {
        match self {
            Light::Directional(l) => l.colour = colour,
            Light::Point(l) => l.colour = colour,
            Light::Spot(l) => l.colour = colour,
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        match self {
            Light::Directional(l) => l.intensity = intensity,
            Light::Point(l) => l.intensity = intensity,
            Light::Spot(l) => l.intensity = intensity,
        }
    }

    pub fn as_spot_mut(&mut self) -> Option<&mut SpotLight> {
        match self {
            Light::Spot(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_point_mut(&mut self) -> Option<&mut PointLight> {
        match self {
            Light::Point(l) => Some(l),
            _ => None,
        }
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Light::Directional(light)
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Light::Spot(light)
    }
}

/// The lights a shader sees for one frame, split by kind and capped at
/// [`MAX_DIR_LIGHTS`], [`MAX_POINT_LIGHTS`] and [`MAX_SPOT_LIGHTS`].
/// Lights past a cap are dropped in registration order.
#[derive(Debug, Default)]
pub struct LightSet<'a> {
    pub directional: Option<&'a DirectionalLight>,
    pub points: Vec<&'a PointLight>,
    pub spots: Vec<&'a SpotLight>,
}

impl<'a> LightSet<'a> {
    pub fn collect(lights: impl IntoIterator<Item = &'a Light>) -> Self {
        let mut set = LightSet::default();
        for light in lights {
            match light {
                Light::Directional(l) if set.directional.is_none() => set.directional = Some(l),
                Light::Point(l) if set.points.len() < MAX_POINT_LIGHTS => set.points.push(l),
                Light::Spot(l) if set.spots.len() < MAX_SPOT_LIGHTS => set.spots.push(l),
                _ => {}
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.directional.iter().count() + self.points.len() + self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cut_off_cosines_follow_degrees() {
        let mut spot = SpotLight::default();
        assert_relative_eq!(spot.inner_cut_off(), 8.75f32.to_radians().cos());
        assert_relative_eq!(spot.outer_cut_off(), 17.5f32.to_radians().cos());

        spot.set_inner_cut_off(30.0);
        assert_eq!(spot.inner_cut_off_deg(), 30.0);
        assert_relative_eq!(spot.inner_cut_off(), 30.0f32.to_radians().cos());

        spot.set_outer_cut_off(60.0);
        assert_relative_eq!(spot.outer_cut_off(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn light_set_caps_each_kind() {
        let mut lights = vec![
            Light::Directional(DirectionalLight::default()),
            Light::Directional(DirectionalLight {
                intensity: 7.0,
                ..Default::default()
            }),
        ];
        for i in 0..(MAX_POINT_LIGHTS + 3) {
            lights.push(Light::Point(PointLight {
                intensity: i as f32,
                ..Default::default()
            }));
        }
        for _ in 0..(MAX_SPOT_LIGHTS + 1) {
            lights.push(Light::Spot(SpotLight::default()));
        }

        let set = LightSet::collect(&lights);
        assert_eq!(set.directional.map(|l| l.intensity), Some(1.0));
        assert_eq!(set.points.len(), MAX_POINT_LIGHTS);
        assert_eq!(set.points[0].intensity, 0.0);
        assert_eq!(set.points[MAX_POINT_LIGHTS - 1].intensity, (MAX_POINT_LIGHTS - 1) as f32);
        assert_eq!(set.spots.len(), MAX_SPOT_LIGHTS);
        assert_eq!(set.len(), MAX_DIR_LIGHTS + MAX_POINT_LIGHTS + MAX_SPOT_LIGHTS);
    }

    #[test]
    fn shared_accessors_cover_every_kind() {
        let mut light: Light = PointLight::default().into();
        light.set_intensity(2.5);
        light.set_colour(Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(light.intensity(), 2.5);
        assert_eq!(light.colour(), Vector3::new(1.0, 0.0, 0.0));
        assert!(light.as_spot_mut().is_none());
        assert!(light.as_point_mut().is_some());
    }
}
