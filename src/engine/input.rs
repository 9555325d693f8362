// Pointer input translation.
// Abstracts winit mouse / touch / wheel events into the PointerEvent
// stream the orbit camera consumes.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

/// Pixels of scroll per wheel "line" (matches typical browser line height).
pub const PIXELS_PER_LINE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

/// Device-independent pointer event. Positions are in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { button: PointerButton, position: Vec2 },
    Move { position: Vec2 },
    Up,
    Cancel,
    /// Vertical scroll in pixels; positive means "scroll down" (zoom out).
    Wheel { delta_y: f32 },
}

impl PointerEvent {
    /// Whether the orbit camera should see this event after the control
    /// panel has had its turn.
    pub fn reaches_camera(&self, panel_consumed: bool, dragging: bool) -> bool {
        match self {
            // Releases always get through so a drag cannot stick over the panel.
            PointerEvent::Up | PointerEvent::Cancel => true,
            // An active drag keeps following the cursor across the panel.
            PointerEvent::Move { .. } if dragging => true,
            _ => !panel_consumed,
        }
    }
}

/// Tracks the cursor so button events (which carry no position in winit)
/// can be turned into positioned pointer events.
pub struct PointerTracker {
    cursor: Vec2,
    /// Touch id currently acting as the pointer, if any.
    active_touch: Option<u64>,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            cursor: Vec2::ZERO,
            active_touch: None,
        }
    }

    /// Translate one winit WindowEvent. Returns `None` for events that do not
    /// affect the pointer.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<PointerEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(PointerEvent::Move { position: self.cursor })
            }
            WindowEvent::MouseInput { state, button, .. } => Some(match state {
                ElementState::Pressed => PointerEvent::Down {
                    button: map_button(*button),
                    position: self.cursor,
                },
                ElementState::Released if *button == MouseButton::Left => PointerEvent::Up,
                ElementState::Released => return None,
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports "scroll up" as positive; the camera expects the opposite.
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -*y * PIXELS_PER_LINE,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                };
                Some(PointerEvent::Wheel { delta_y })
            }
            WindowEvent::Touch(touch) => self.translate_touch(touch),
            WindowEvent::Focused(false) => Some(PointerEvent::Cancel),
            _ => None,
        }
    }

    fn translate_touch(&mut self, touch: &winit::event::Touch) -> Option<PointerEvent> {
        let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        match (touch.phase, self.active_touch) {
            (TouchPhase::Started, None) => {
                self.active_touch = Some(touch.id);
                self.cursor = position;
                Some(PointerEvent::Down { button: PointerButton::Primary, position })
            }
            (TouchPhase::Moved, Some(id)) if id == touch.id => {
                self.cursor = position;
                Some(PointerEvent::Move { position })
            }
            (TouchPhase::Ended, Some(id)) if id == touch.id => {
                self.active_touch = None;
                Some(PointerEvent::Up)
            }
            (TouchPhase::Cancelled, Some(id)) if id == touch.id => {
                self.active_touch = None;
                Some(PointerEvent::Cancel)
            }
            _ => None,
        }
    }
}

fn map_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        _ => PointerButton::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;

    fn device() -> DeviceId {
        // SAFETY: only compared against other dummy ids inside these tests.
        unsafe { DeviceId::dummy() }
    }

    fn cursor_moved(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(x, y),
        }
    }

    fn mouse(state: ElementState, button: MouseButton) -> WindowEvent {
        WindowEvent::MouseInput { device_id: device(), state, button }
    }

    #[test]
    fn press_uses_last_cursor_position() {
        let mut tracker = PointerTracker::new();
        assert_eq!(
            tracker.translate(&cursor_moved(12.0, 34.0)),
            Some(PointerEvent::Move { position: Vec2::new(12.0, 34.0) })
        );
        assert_eq!(
            tracker.translate(&mouse(ElementState::Pressed, MouseButton::Left)),
            Some(PointerEvent::Down { button: PointerButton::Primary, position: Vec2::new(12.0, 34.0) })
        );
        assert_eq!(tracker.translate(&mouse(ElementState::Released, MouseButton::Left)), Some(PointerEvent::Up));
    }

    #[test]
    fn releasing_other_buttons_is_ignored() {
        let mut tracker = PointerTracker::new();
        assert_eq!(tracker.translate(&mouse(ElementState::Released, MouseButton::Right)), None);
    }

    #[test]
    fn wheel_lines_become_pixels_with_down_positive() {
        let mut tracker = PointerTracker::new();
        let event = WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            phase: TouchPhase::Moved,
        };
        assert_eq!(tracker.translate(&event), Some(PointerEvent::Wheel { delta_y: -PIXELS_PER_LINE }));
    }

    #[test]
    fn focus_loss_cancels() {
        let mut tracker = PointerTracker::new();
        assert_eq!(tracker.translate(&WindowEvent::Focused(false)), Some(PointerEvent::Cancel));
        assert_eq!(tracker.translate(&WindowEvent::Focused(true)), None);
    }

    #[test]
    fn panel_swallows_presses_but_not_releases() {
        let down = PointerEvent::Down { button: PointerButton::Primary, position: Vec2::ZERO };
        assert!(!down.reaches_camera(true, false));
        assert!(down.reaches_camera(false, false));
        assert!(PointerEvent::Up.reaches_camera(true, true));
        assert!(PointerEvent::Cancel.reaches_camera(true, false));
        assert!(!PointerEvent::Wheel { delta_y: 1.0 }.reaches_camera(true, false));
    }

    #[test]
    fn drag_moves_pass_over_the_panel() {
        let mv = PointerEvent::Move { position: Vec2::new(4.0, 2.0) };
        assert!(mv.reaches_camera(true, true));
        assert!(!mv.reaches_camera(true, false));
        assert!(mv.reaches_camera(false, false));
    }
}
