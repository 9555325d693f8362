// Orbit camera driven by pointer drag and wheel input.
//
// Camera model:
//   - The mesh sits at the origin and is rotated by yaw (about Y) then pitch (about X)
//   - The eye sits on +Z at `distance`, looking down -Z
//   - Drag rotates, wheel zooms multiplicatively
//   - Auto-rotate adds a time-proportional offset at render time only, so
//     stored yaw/pitch always reflect the last manual orientation

use glam::{Mat4, Vec2};

use super::input::{PointerButton, PointerEvent};

pub const DEFAULT_YAW: f32 = 0.8;
pub const DEFAULT_PITCH: f32 = -0.4;
pub const DEFAULT_DISTANCE: f32 = 4.0;

pub const PITCH_MIN: f32 = -1.3;
pub const PITCH_MAX: f32 = 0.3;
pub const DISTANCE_MIN: f32 = 2.0;
pub const DISTANCE_MAX: f32 = 10.0;

/// Radians of rotation per pixel of drag.
pub const DRAG_SENSITIVITY: f32 = 0.005;
/// Relative zoom per pixel of wheel delta.
pub const WHEEL_SENSITIVITY: f32 = 0.001;

/// Auto-rotate angular speed in radians per millisecond (yaw); pitch turns at 0.7×.
const AUTO_ROTATE_RATE: f64 = 0.001;
const AUTO_ROTATE_PITCH_RATIO: f64 = 0.7;

pub const FOV_Y_DEGREES: f32 = 60.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;

/// Pointer state of the orbit controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// Primary button held; `last` is the pointer position of the previous
    /// transition, used to compute the next move delta.
    Dragging { last: Vec2 },
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    yaw: f32,
    /// Private: always clamped to [PITCH_MIN, PITCH_MAX]. Use pitch() to read.
    pitch: f32,
    /// Private: always clamped to [DISTANCE_MIN, DISTANCE_MAX]. Use distance() to read.
    distance: f32,
    pub auto_rotate: bool,
    drag: DragState,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            distance: DEFAULT_DISTANCE,
            auto_rotate: true,
            drag: DragState::Idle,
        }
    }

    pub fn yaw(&self) -> f32 { self.yaw }
    pub fn pitch(&self) -> f32 { self.pitch }
    pub fn distance(&self) -> f32 { self.distance }
    pub fn drag_state(&self) -> DragState { self.drag }

    /// Feed one pointer event through the Idle/Dragging state machine.
    pub fn handle(&mut self, event: PointerEvent) {
        match (self.drag, event) {
            (DragState::Idle, PointerEvent::Down { button: PointerButton::Primary, position }) => {
                self.drag = DragState::Dragging { last: position };
            }
            (DragState::Dragging { last }, PointerEvent::Move { position }) => {
                let delta = position - last;
                self.rotate(delta);
                self.drag = DragState::Dragging { last: position };
            }
            (DragState::Dragging { .. }, PointerEvent::Up | PointerEvent::Cancel) => {
                self.drag = DragState::Idle;
            }
            (_, PointerEvent::Wheel { delta_y }) => self.zoom(delta_y),
            _ => {}
        }
    }

    fn rotate(&mut self, delta: Vec2) {
        self.yaw += delta.x * DRAG_SENSITIVITY;
        self.pitch = (self.pitch + delta.y * DRAG_SENSITIVITY).clamp(PITCH_MIN, PITCH_MAX);
    }

    /// Scale distance by `1 + delta_y * WHEEL_SENSITIVITY`; positive deltas zoom out.
    fn zoom(&mut self, delta_y: f32) {
        let factor = 1.0 + delta_y * WHEEL_SENSITIVITY;
        if factor.is_finite() {
            self.distance = (self.distance * factor).clamp(DISTANCE_MIN, DISTANCE_MAX);
        }
    }

    /// Restore the default orientation and distance. Drag state and the
    /// auto-rotate flag are left alone.
    pub fn reset(&mut self) {
        self.yaw = DEFAULT_YAW;
        self.pitch = DEFAULT_PITCH;
        self.distance = DEFAULT_DISTANCE;
    }

    /// Effective (yaw, pitch) at `time_ms`, including auto-rotation.
    pub fn orientation(&self, time_ms: f64) -> (f32, f32) {
        if !self.auto_rotate {
            return (self.yaw, self.pitch);
        }
        let t = time_ms * AUTO_ROTATE_RATE;
        let yaw = (self.yaw as f64 + t) as f32;
        let pitch = (self.pitch as f64 + t * AUTO_ROTATE_PITCH_RATIO) as f32;
        (yaw, pitch)
    }

    /// Model matrix: rotateY(yaw) · rotateX(pitch).
    pub fn model_matrix(&self, time_ms: f64) -> Mat4 {
        let (yaw, pitch) = self.orientation(time_ms);
        Mat4::from_rotation_y(yaw) * Mat4::from_rotation_x(pitch)
    }

    /// View matrix: the eye backs off along +Z.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(glam::Vec3::new(0.0, 0.0, -self.distance))
    }

    pub fn projection_matrix(aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, NEAR, FAR)
    }

    /// Combined view-projection matrix for a viewport of the given aspect.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        Self::projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Down { button: PointerButton::Primary, position: Vec2::new(x, y) }
    }

    fn moved(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Move { position: Vec2::new(x, y) }
    }

    #[test]
    fn drag_rotates_by_sensitivity() {
        let mut cam = OrbitCamera::new();
        cam.handle(down(100.0, 100.0));
        cam.handle(moved(120.0, 110.0));
        assert!((cam.yaw() - (DEFAULT_YAW + 20.0 * DRAG_SENSITIVITY)).abs() < 1e-6);
        assert!((cam.pitch() - (DEFAULT_PITCH + 10.0 * DRAG_SENSITIVITY)).abs() < 1e-6);
        // Deltas are relative to the previous move, not the anchor.
        cam.handle(moved(130.0, 110.0));
        assert!((cam.yaw() - (DEFAULT_YAW + 30.0 * DRAG_SENSITIVITY)).abs() < 1e-6);
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut cam = OrbitCamera::new();
        cam.handle(moved(500.0, 500.0));
        assert_eq!(cam.yaw(), DEFAULT_YAW);
        assert_eq!(cam.drag_state(), DragState::Idle);
    }

    #[test]
    fn secondary_button_does_not_start_drag() {
        let mut cam = OrbitCamera::new();
        cam.handle(PointerEvent::Down { button: PointerButton::Secondary, position: Vec2::ZERO });
        assert_eq!(cam.drag_state(), DragState::Idle);
    }

    #[test]
    fn release_and_cancel_end_drag() {
        for end in [PointerEvent::Up, PointerEvent::Cancel] {
            let mut cam = OrbitCamera::new();
            cam.handle(down(0.0, 0.0));
            cam.handle(end);
            assert_eq!(cam.drag_state(), DragState::Idle);
            cam.handle(moved(50.0, 50.0));
            assert_eq!(cam.yaw(), DEFAULT_YAW);
        }
    }

    #[test]
    fn pitch_and_distance_stay_clamped() {
        let mut cam = OrbitCamera::new();
        cam.handle(down(0.0, 0.0));
        for i in 1..200 {
            let y = if i % 2 == 0 { 4000.0 } else { -4000.0 } * i as f32;
            cam.handle(moved(0.0, y));
            assert!((PITCH_MIN..=PITCH_MAX).contains(&cam.pitch()));
            cam.handle(PointerEvent::Wheel { delta_y: y });
            assert!((DISTANCE_MIN..=DISTANCE_MAX).contains(&cam.distance()));
        }
    }

    #[test]
    fn wheel_scales_distance_in_any_state() {
        let mut cam = OrbitCamera::new();
        cam.handle(PointerEvent::Wheel { delta_y: 100.0 });
        assert!((cam.distance() - DEFAULT_DISTANCE * 1.1).abs() < 1e-5);
        cam.handle(down(0.0, 0.0));
        cam.handle(PointerEvent::Wheel { delta_y: -100.0 });
        assert!((cam.distance() - DEFAULT_DISTANCE * 1.1 * 0.9).abs() < 1e-5);
        assert!(matches!(cam.drag_state(), DragState::Dragging { .. }));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut cam = OrbitCamera::new();
        cam.handle(down(0.0, 0.0));
        cam.handle(moved(300.0, -90.0));
        cam.handle(PointerEvent::Wheel { delta_y: 900.0 });
        cam.reset();
        assert_eq!((cam.yaw(), cam.pitch(), cam.distance()), (DEFAULT_YAW, DEFAULT_PITCH, DEFAULT_DISTANCE));
    }

    #[test]
    fn auto_rotate_does_not_mutate_stored_orientation() {
        let mut cam = OrbitCamera::new();
        let (yaw, pitch) = cam.orientation(2000.0);
        assert!((yaw - (DEFAULT_YAW + 2.0)).abs() < 1e-5);
        assert!((pitch - (DEFAULT_PITCH + 1.4)).abs() < 1e-5);

        cam.auto_rotate = false;
        assert_eq!(cam.orientation(2000.0), (DEFAULT_YAW, DEFAULT_PITCH));
    }

    #[test]
    fn model_applies_yaw_after_pitch() {
        let mut cam = OrbitCamera::new();
        cam.auto_rotate = false;
        let expected = Mat4::from_rotation_y(DEFAULT_YAW) * Mat4::from_rotation_x(DEFAULT_PITCH);
        assert!(cam.model_matrix(0.0).abs_diff_eq(expected, 1e-6));
        assert_eq!(cam.view_matrix().w_axis.z, -DEFAULT_DISTANCE);
    }
}
