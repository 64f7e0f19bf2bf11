//! Orbit camera, projection and the per-pass constants derived from them.
//!
//! The camera sits on a sphere around the origin, described by spherical
//! coordinates, and always looks at the origin. Mouse drags change the angles
//! (left button) or the sphere radius (right button).

use std::f32::consts::PI;

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};

use crate::{resources::frame::PassConstants, timer::GameTimer};

/// Radians of rotation per pixel of mouse movement (a quarter of a degree).
const ROTATION_PER_PIXEL: f32 = 0.25 * PI / 180.0;
/// Scene units of zoom per pixel of mouse movement.
const ZOOM_PER_PIXEL: f32 = 0.05;

pub const MIN_PHI: f32 = 0.1;
pub const MAX_PHI: f32 = PI - 0.1;
pub const MIN_RADIUS: f32 = 5.0;
pub const MAX_RADIUS: f32 = 150.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Angle around the y-axis.
    pub theta: f32,
    /// Angle from the +y axis.
    pub phi: f32,
    pub radius: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(1.5 * PI, 0.2 * PI, 15.0)
    }
}

impl OrbitCamera {
    pub fn new(theta: f32, phi: f32, radius: f32) -> Self {
        Self {
            theta,
            phi: phi.clamp(MIN_PHI, MAX_PHI),
            radius: radius.clamp(MIN_RADIUS, MAX_RADIUS),
        }
    }

    /// Orbit around the target by a mouse delta in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.theta += ROTATION_PER_PIXEL * dx;
        self.phi = (self.phi + ROTATION_PER_PIXEL * dy).clamp(MIN_PHI, MAX_PHI);
    }

    /// Move closer to or further from the target by a mouse delta in pixels.
    pub fn zoom(&mut self, dx: f32, dy: f32) {
        self.radius = (self.radius + ZOOM_PER_PIXEL * (dx - dy)).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    /// Spherical to cartesian.
    pub fn eye_position(&self) -> Point3<f32> {
        Point3::new(
            self.radius * self.phi.sin() * self.theta.cos(),
            self.radius * self.phi.cos(),
            self.radius * self.phi.sin() * self.theta.sin(),
        )
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_lh(self.eye_position(), Point3::new(0.0, 0.0, 0.0), Vector3::unit_y())
    }
}

/// Left-handed perspective projection mapping depth to [0, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: f32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            fovy,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let y_scale = 1.0 / (0.5 * self.fovy).tan();
        let x_scale = y_scale / self.aspect;
        let range = self.zfar / (self.zfar - self.znear);
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            x_scale, 0.0,     0.0,                  0.0,
            0.0,     y_scale, 0.0,                  0.0,
            0.0,     0.0,     range,                1.0,
            0.0,     0.0,     -range * self.znear,  0.0,
        );
        matrix
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(1280, 720, 0.25 * PI, 1.0, 1000.0)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

fn inverse_or_identity(m: Matrix4<f32>) -> Matrix4<f32> {
    m.invert().unwrap_or_else(Matrix4::identity)
}

/// Build the constants every draw of the frame shares.
pub fn pass_constants(
    camera: &OrbitCamera,
    projection: &Projection,
    size: (u32, u32),
    timer: &GameTimer,
) -> PassConstants {
    let view = camera.view_matrix();
    let proj = projection.calc_matrix();
    let view_proj = proj * view;
    let width = size.0.max(1) as f32;
    let height = size.1.max(1) as f32;

    PassConstants {
        view: view.into(),
        inv_view: inverse_or_identity(view).into(),
        proj: proj.into(),
        inv_proj: inverse_or_identity(proj).into(),
        view_proj: view_proj.into(),
        inv_view_proj: inverse_or_identity(view_proj).into(),
        eye_pos_w: camera.eye_position().into(),
        _padding: 0.0,
        render_target_size: [width, height],
        inv_render_target_size: [1.0 / width, 1.0 / height],
        near_z: projection.znear,
        far_z: projection.zfar,
        total_time: timer.total_time(),
        delta_time: timer.delta_time(),
    }
}
