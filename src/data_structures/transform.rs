//! Position, Euler rotation and scale of anything placed in the scene.
//!
//! Rotation is stored as Euler angles in degrees (pitch around X, yaw around Y,
//! roll around Z). The derived direction vectors only depend on pitch and yaw.

use std::ops::{Add, AddAssign};

use cgmath::{InnerSpace, Matrix4, Rad, Vector3, Zero};

/// World-space up axis.
pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles in degrees.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(position: impl Into<Vector3<f32>>) -> Self {
        Self {
            position: position.into(),
            ..Self::new()
        }
    }

    pub fn with_rotation(mut self, degrees: impl Into<Vector3<f32>>) -> Self {
        self.rotation = degrees.into();
        self
    }

    pub fn with_scale(mut self, scale: impl Into<Vector3<f32>>) -> Self {
        self.scale = scale.into();
        self
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.position += offset;
    }

    pub fn rotate(&mut self, degrees: Vector3<f32>) {
        self.rotation += degrees;
    }

    /// Unit vector the transform is facing.
    ///
    /// A zero-length result is returned as is instead of being normalised.
    pub fn forward(&self) -> Vector3<f32> {
        let pitch = self.rotation.x.to_radians();
        let yaw = self.rotation.y.to_radians();
        normalize_or_keep(Vector3::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            yaw.cos() * pitch.cos(),
        ))
    }

    pub fn right(&self) -> Vector3<f32> {
        normalize_or_keep(self.forward().cross(WORLD_UP))
    }

    pub fn up(&self) -> Vector3<f32> {
        normalize_or_keep(self.right().cross(self.forward()))
    }

    /// Model matrix: translation, then X, Y and Z rotation, then scale.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x.to_radians()))
            * Matrix4::from_angle_y(Rad(self.rotation.y.to_radians()))
            * Matrix4::from_angle_z(Rad(self.rotation.z.to_radians()))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

pub(crate) fn normalize_or_keep(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > 0.0 { v.normalize() } else { v }
}

impl Add<Transform> for Transform {
    type Output = Self;

    fn add(self, rhs: Transform) -> Self::Output {
        Transform {
            position: self.position + rhs.position,
            rotation: self.rotation + rhs.rotation,
            scale: self.scale + rhs.scale,
        }
    }
}

impl AddAssign<Transform> for Transform {
    fn add_assign(&mut self, rhs: Transform) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::{SquareMatrix, Vector4};

    use super::*;

    #[test]
    fn identity_faces_positive_z() {
        let t = Transform::new();
        assert_relative_eq!(t.forward(), Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(t.right(), Vector3::new(-1.0, 0.0, 0.0));
        assert_relative_eq!(t.up(), Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(t.to_matrix(), Matrix4::identity());
    }

    #[test]
    fn yaw_turns_forward_towards_x() {
        let t = Transform::new().with_rotation([0.0, 90.0, 0.0]);
        assert_relative_eq!(t.forward(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn zero_vectors_are_not_normalised() {
        let v = normalize_or_keep(Vector3::zero());
        assert_eq!(v, Vector3::zero());
        assert!(!v.x.is_nan());
    }

    #[test]
    fn direction_ignores_position_and_scale() {
        let a = Transform::new().with_rotation([10.0, 20.0, 0.0]);
        let b = Transform::from_position([5.0, -3.0, 2.0])
            .with_rotation([10.0, 20.0, 0.0])
            .with_scale([4.0, 4.0, 4.0]);
        assert_relative_eq!(a.forward(), b.forward());
    }

    #[test]
    fn matrix_scales_before_translating() {
        let t = Transform::from_position([1.0, 2.0, 3.0]).with_scale([2.0, 2.0, 2.0]);
        let p = t.to_matrix() * Vector4::new(1.0, 1.0, 1.0, 1.0);
        assert_relative_eq!(p, Vector4::new(3.0, 4.0, 5.0, 1.0));
    }

    #[test]
    fn add_is_componentwise() {
        let mut a = Transform::from_position([1.0, 0.0, 0.0]);
        a += Transform::from_position([0.0, 1.0, 0.0]).with_rotation([0.0, 5.0, 0.0]);
        assert_eq!(a.position, Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(a.rotation, Vector3::new(0.0, 5.0, 0.0));
        assert_eq!(a.scale, Vector3::new(2.0, 2.0, 2.0));
    }
}
