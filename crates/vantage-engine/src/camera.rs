use crate::AbstractKey;
use cgmath::{perspective, InnerSpace, Matrix4, Point3, Rad, Vector3};
use std::f32::consts::FRAC_PI_2;

const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Wheel deltas arrive as discrete events, so zoom is applied per event
/// instead of being scaled by frame time.
const SCROLL_STEP: f32 = 0.01;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// An explicit camera pose, as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAt {
    pub eye: Point3<f32>,
    pub center: Point3<f32>,
    pub up: Vector3<f32>,
}

/// First-person camera: a position plus yaw and pitch, roll-free. `up` in a
/// [`LookAt`] pose is accepted for command-line compatibility but the
/// controller keeps the horizon level.
#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn from_look_at(pose: &LookAt) -> Self {
        let direction = pose.center - pose.eye;
        if direction.magnitude2() < 1e-12 {
            // Degenerate pose; face -z like an untouched camera.
            return Self::new(pose.eye, Rad(-FRAC_PI_2), Rad(0.0));
        }
        let direction = direction.normalize();
        let yaw = Rad(direction.z.atan2(direction.x));
        let pitch = Rad(direction.y.asin().clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
        Self::new(pose.eye, yaw, pitch)
    }

    pub fn front(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    pub fn eye(&self) -> Point3<f32> {
        self.position
    }

    /// A point one unit ahead, for reporting the pose in look-at form.
    pub fn center(&self) -> Point3<f32> {
        self.position + self.front()
    }

    pub fn up(&self) -> Vector3<f32> {
        Vector3::unit_y()
    }

    pub fn left(&self) -> Vector3<f32> {
        self.up().cross(self.front()).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front(), Vector3::unit_y())
    }
}

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

#[derive(Debug)]
pub struct CameraController {
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            speed,
            sensitivity,
        }
    }

    /// Drops held-key state. Called when the shell loses key events, e.g.
    /// when a text widget takes focus mid-press and swallows the release.
    pub fn reset_move_amount(&mut self) {
        self.amount_left = 0.0;
        self.amount_right = 0.0;
        self.amount_forward = 0.0;
        self.amount_backward = 0.0;
        self.amount_up = 0.0;
        self.amount_down = 0.0;
    }

    pub fn process_keyboard(&mut self, key: AbstractKey, pressing: bool) -> bool {
        let amount = if pressing { 1.0 } else { 0.0 };
        match key {
            AbstractKey::CameraMoveForward => {
                self.amount_forward = amount;
                true
            }
            AbstractKey::CameraMoveBackward => {
                self.amount_backward = amount;
                true
            }
            AbstractKey::CameraMoveLeft => {
                self.amount_left = amount;
                true
            }
            AbstractKey::CameraMoveRight => {
                self.amount_right = amount;
                true
            }
            AbstractKey::CameraMoveUp => {
                self.amount_up = amount;
                true
            }
            AbstractKey::CameraMoveDown => {
                self.amount_down = amount;
                true
            }
        }
    }

    pub fn process_mouse(&mut self, mouse_dx: f32, mouse_dy: f32) {
        self.rotate_horizontal = mouse_dx;
        self.rotate_vertical = mouse_dy;
    }

    pub fn process_scroll(&mut self, delta: f32) {
        self.scroll = -delta;
    }

    pub fn update_camera(&mut self, camera: &mut Camera, dt: instant::Duration) {
        self.update_position(camera, dt);
        self.update_direction(camera);
    }

    pub fn update_direction(&mut self, camera: &mut Camera) {
        camera.yaw += Rad(self.rotate_horizontal) * self.sensitivity;
        camera.pitch += Rad(-self.rotate_vertical) * self.sensitivity;

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;

        if camera.pitch < -Rad(SAFE_FRAC_PI_2) {
            camera.pitch = -Rad(SAFE_FRAC_PI_2);
        } else if camera.pitch > Rad(SAFE_FRAC_PI_2) {
            camera.pitch = Rad(SAFE_FRAC_PI_2);
        }
    }

    pub fn update_position(&mut self, camera: &mut Camera, dt: instant::Duration) {
        let dt = dt.as_secs_f32();

        let (yaw_sin, yaw_cos) = camera.yaw.0.sin_cos();

        let forward = Vector3::new(yaw_cos, 0.0, yaw_sin).normalize();
        let right = Vector3::new(-yaw_sin, 0.0, yaw_cos).normalize();
        camera.position += forward * (self.amount_forward - self.amount_backward) * self.speed * dt;
        camera.position += right * (self.amount_right - self.amount_left) * self.speed * dt;

        let (pitch_sin, pitch_cos) = camera.pitch.0.sin_cos();
        let scrollward =
            Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize();
        camera.position += scrollward * self.scroll * self.speed * self.sensitivity * SCROLL_STEP;
        self.scroll = 0.0;

        camera.position.y += (self.amount_up - self.amount_down) * self.speed * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn assert_close(actual: Vector3<f32>, expected: [f32; 3]) {
        let delta = actual - Vector3::new(expected[0], expected[1], expected[2]);
        assert!(
            delta.magnitude() < 1e-4,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_look_at_recovers_view_direction() {
        let pose = LookAt {
            eye: Point3::new(1.0, 2.0, 3.0),
            center: Point3::new(4.0, 2.0, 7.0),
            up: Vector3::unit_y(),
        };
        let camera = Camera::from_look_at(&pose);
        assert_close(camera.front(), [0.6, 0.0, 0.8]);
        assert_eq!(camera.eye(), pose.eye);
    }

    #[test]
    fn test_look_at_handles_pitch() {
        let pose = LookAt {
            eye: Point3::new(0.0, 0.0, 0.0),
            center: Point3::new(0.0, 1.0, 1.0),
            up: Vector3::unit_y(),
        };
        let camera = Camera::from_look_at(&pose);
        let inv_sqrt2 = 1.0 / 2.0f32.sqrt();
        assert_close(camera.front(), [0.0, inv_sqrt2, inv_sqrt2]);
    }

    #[test]
    fn test_look_at_survives_degenerate_pose() {
        let eye = Point3::new(5.0, 5.0, 5.0);
        let camera = Camera::from_look_at(&LookAt {
            eye,
            center: eye,
            up: Vector3::unit_y(),
        });
        assert_close(camera.front(), [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_left_is_perpendicular_to_front() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.4), Rad(0.2));
        assert!(camera.front().dot(camera.left()).abs() < 1e-5);
        assert!((camera.left().magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut controller = CameraController::new(1.0, 1.0);
        controller.process_mouse(0.0, -100.0);
        controller.update_direction(&mut camera);
        assert!((camera.front().y - SAFE_FRAC_PI_2.sin()).abs() < 1e-4);
    }

    #[test]
    fn test_forward_movement_follows_yaw() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut controller = CameraController::new(2.0, 1.0);
        controller.process_keyboard(AbstractKey::CameraMoveForward, true);
        controller.update_position(&mut camera, Duration::from_secs(1));
        assert_close(camera.position - Point3::new(0.0, 0.0, 0.0), [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scroll_zooms_even_without_frame_time() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut controller = CameraController::new(1.0, 1.0);
        controller.process_scroll(-100.0);
        controller.update_position(&mut camera, Duration::ZERO);
        assert!(camera.position.x > 0.0);
    }

    #[test]
    fn test_reset_move_amount_stops_held_keys() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut controller = CameraController::new(1.0, 1.0);
        controller.process_keyboard(AbstractKey::CameraMoveUp, true);
        controller.reset_move_amount();
        controller.update_position(&mut camera, Duration::from_secs(1));
        assert_eq!(camera.position.y, 0.0);
    }
}
