//! Camera value type and the view/projection math shared by both passes.

use cgmath::{EuclideanSpace, Matrix3, Matrix4, Point3, Rad, Vector3};

/// Rotation from Euler angles (radians), composed `Rz · Ry · Rx`.
pub fn euler_rotation(angles: Vector3<f32>) -> Matrix3<f32> {
    Matrix3::from_angle_z(Rad(angles.z)) * Matrix3::from_angle_y(Rad(angles.y)) * Matrix3::from_angle_x(Rad(angles.x))
}

/// Where the scene is seen from. Recomputed by the caller every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vector3<f32>,
    /// Euler angles in radians.
    pub rotation: Vector3<f32>,
    pub aspect: f32,
    /// Vertical field of view in radians.
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    /// Width and height of the render target in pixels.
    pub resolution: [i32; 2],
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            aspect: 1.0,
            // approximately 30 degrees
            fovy: 0.5,
            near: 0.1,
            far: 200.0,
            resolution: [640, 480],
        }
    }
}

impl Camera {
    /// Sets the resolution and derives the aspect ratio from it.
    pub fn set_resolution(&mut self, width: i32, height: i32) {
        self.resolution = [width, height];
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn rotation_matrix(&self) -> Matrix3<f32> {
        euler_rotation(self.rotation)
    }

    /// Direction the camera looks at: the rotated `-Z` axis.
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation_matrix() * Vector3::new(0.0, 0.0, -1.0)
    }

    pub fn projection(&self) -> Matrix4<f32> {
        cgmath::perspective(Rad(self.fovy), self.aspect, self.near, self.far)
    }

    pub fn view(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        Matrix4::look_at_rh(eye, eye + self.forward(), Vector3::unit_y())
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection() * self.view()
    }
}
