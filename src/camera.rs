//! Fixed camera and perspective projection.

use cgmath::{Matrix4, Rad, Vector3, perspective};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Perspective projection tracking the surface aspect ratio.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// A stationary camera: a translation plus a slight downward tilt.
///
/// The view matrix moves the world in front of the camera, so `position` is
/// applied as-is rather than inverted.
#[derive(Debug)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub tilt: Rad<f32>,
}

impl Camera {
    pub fn new<P: Into<Vector3<f32>>, T: Into<Rad<f32>>>(position: P, tilt: T) -> Self {
        Self {
            position: position.into(),
            tilt: tilt.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from_angle_x(self.tilt)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new((0.0, 0.0, -3.0), Rad(0.05 * std::f32::consts::PI))
    }
}
