// ============================================================================
// ORBIT CAMERA — view manipulation for the main view
// ============================================================================
//
// Receives the events a stroke session forwards while it is in
// `ManipulatingView`.  Drag orbits, Shift+drag pans, Ctrl+drag dollies.

use glam::{Mat4, Vec3};

use crate::coords::ScreenPoint;
use crate::stroke::{InputEvent, Modifiers};

const ORBIT_SPEED: f32 = 0.01; // radians per pixel
const PAN_SPEED: f32 = 0.0025; // scene units per pixel per unit distance
const DOLLY_SPEED: f32 = 0.01;
const MIN_DISTANCE: f32 = 0.2;
const MAX_DISTANCE: f32 = 50.0;
const PITCH_LIMIT: f32 = 1.55;

#[derive(Clone, Copy, Debug, PartialEq)]
enum DragMode {
    Orbit,
    Pan,
    Dolly,
}

#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Rotation of the model around the vertical axis.
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
    pub fov_y: f32,
    drag: Option<(DragMode, ScreenPoint)>,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 2.5,
            pitch: 0.0,
            distance: 3.0,
            target: Vec3::ZERO,
            fov_y: 45f32.to_radians(),
            drag: None,
        }
    }
}

impl OrbitCamera {
    /// Consume a forwarded event.  Returns `true` if the view changed.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::Press { modifiers, pos, .. } => {
                self.drag = Some((Self::mode_for(modifiers), pos));
                false
            }
            InputEvent::Move { pos, .. } => {
                let Some((mode, last)) = self.drag else {
                    return false;
                };
                let dx = pos.x - last.x;
                let dy = pos.y - last.y;
                self.drag = Some((mode, pos));
                match mode {
                    DragMode::Orbit => self.orbit(dx, dy),
                    DragMode::Pan => self.pan(dx, dy),
                    DragMode::Dolly => self.dolly(dy * DOLLY_SPEED * self.distance),
                }
                dx != 0.0 || dy != 0.0
            }
            InputEvent::Release { .. } => {
                self.drag = None;
                false
            }
        }
    }

    fn mode_for(modifiers: Modifiers) -> DragMode {
        if modifiers.shift {
            DragMode::Pan
        } else if modifiers.ctrl {
            DragMode::Dolly
        } else {
            DragMode::Orbit
        }
    }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * ORBIT_SPEED;
        self.pitch = (self.pitch + dy * ORBIT_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        let scale = PAN_SPEED * self.distance;
        self.target += Vec3::new(-dx * scale, dy * scale, 0.0);
    }

    /// Move towards (negative) or away from (positive) the target.
    pub fn dolly(&mut self, amount: f32) {
        self.distance = (self.distance + amount).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Scroll wheel zoom, in egui points.
    pub fn scroll(&mut self, delta_y: f32) -> bool {
        if delta_y == 0.0 {
            return false;
        }
        self.dolly(-delta_y * 0.002 * self.distance);
        true
    }

    /// Model rotation: the model spins in place, the eye stays on +Z.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.pitch) * Mat4::from_rotation_y(self.yaw)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.target + Vec3::new(0.0, 0.0, self.distance);
        Mat4::look_at_rh(eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.05, 100.0)
    }
}
