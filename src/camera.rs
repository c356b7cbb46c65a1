//! Perspective camera driven by a [`Transform`].

use cgmath::{ElementWise, InnerSpace, Matrix4, Point3, Vector3};

use crate::data_structures::transform::{Transform, WORLD_UP, normalize_or_keep};

/// Pitch is clamped to this many degrees either side of the horizon.
pub const MAX_PITCH: f32 = 89.9;

/// wgpu's clip space has depth in 0..1 while cgmath produces -1..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub transform: Transform,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub move_speed: f32,
    pub rotation_speed: f32,
    base_fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Transform::new())
    }
}

impl Camera {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            fov: 70.0,
            aspect: 1.0,
            near: 0.01,
            far: 10000.0,
            move_speed: 0.1,
            rotation_speed: 1.0,
            base_fov: 70.0,
        }
    }

    /// Adds `delta` (degrees, normalised when nonzero) scaled per axis by `scale` and
    /// by the rotation speed. Pitch stays within [`MAX_PITCH`].
    pub fn rotate(&mut self, delta: Vector3<f32>, scale: Vector3<f32>) {
        let delta = normalize_or_keep(delta).mul_element_wise(scale);
        self.transform.rotation += delta * self.rotation_speed;
        self.transform.rotation.x = self.transform.rotation.x.clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Moves along the camera's own axes: `z` forward, `x` right, `y` world up.
    pub fn translate(&mut self, direction: Vector3<f32>, scale: Vector3<f32>) {
        let mut movement =
            self.transform.forward() * direction.z + self.transform.right() * direction.x;
        movement.y += direction.y;
        let movement = normalize_or_keep(movement);
        self.transform.position += movement.mul_element_wise(scale) * self.move_speed;
    }

    pub fn zoom(&mut self, amount: f32) {
        self.fov -= amount;
    }

    pub fn reset_zoom(&mut self) {
        self.fov = self.base_fov;
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.base_fov = fov;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::new(
            self.transform.position.x,
            self.transform.position.y,
            self.transform.position.z,
        );
        let target = eye + self.transform.forward();
        let up = self.transform.up();
        // Looking straight up or down leaves no usable up vector.
        let up = if up.magnitude2() > 0.0 { up } else { WORLD_UP };
        Matrix4::look_at_rh(eye, target, up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(cgmath::Deg(self.fov), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn defaults() {
        let camera = Camera::default();
        assert_eq!(camera.fov, 70.0);
        assert_eq!(camera.near, 0.01);
        assert_eq!(camera.far, 10000.0);
        assert_eq!(camera.move_speed, 0.1);
        assert_eq!(camera.rotation_speed, 1.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.rotate(Vector3::new(1.0, 0.0, 0.0), Vector3::new(500.0, 500.0, 500.0));
        assert_eq!(camera.transform.rotation.x, MAX_PITCH);
        camera.rotate(Vector3::new(-1.0, 0.0, 0.0), Vector3::new(1000.0, 0.0, 0.0));
        assert_eq!(camera.transform.rotation.x, -MAX_PITCH);
    }

    #[test]
    fn zero_rotation_is_a_no_op() {
        let mut camera = Camera::default();
        camera.rotate(Vector3::new(0.0, 0.0, 0.0), Vector3::new(3.0, 3.0, 3.0));
        assert_eq!(camera.transform.rotation, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn translate_moves_forward_by_move_speed() {
        let mut camera = Camera::default();
        camera.translate(Vector3::new(0.0, 0.0, 5.0), Vector3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(camera.transform.position, Vector3::new(0.0, 0.0, 0.1));
    }

    #[test]
    fn zoom_and_reset() {
        let mut camera = Camera::default();
        camera.set_fov(60.0);
        camera.zoom(15.0);
        assert_eq!(camera.fov, 45.0);
        camera.reset_zoom();
        assert_eq!(camera.fov, 60.0);
    }

    #[test]
    fn point_in_front_lands_inside_clip_volume() {
        let camera = Camera::default();
        let clip = camera.view_projection() * cgmath::Vector4::new(0.0, 0.0, 10.0, 1.0);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0, "depth was {depth}");
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
    }
}
