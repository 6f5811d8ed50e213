use eframe::egui::{Color32, Painter, Pos2, Rect, Vec2, vec2};
use glam::{Mat3, Vec3};

use crate::network::Rgb;
use crate::util::stable_pair;

const NEAR_PLANE: f32 = 0.5;
const MIN_DISTANCE: f32 = 8.0;
const MAX_DISTANCE: f32 = 260.0;
const MAX_PITCH: f32 = 1.4;
const ORBIT_SPEED: f32 = 0.008;
const BACKGROUND_STARS: usize = 140;

/// Orbit camera around the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Camera {
    pub(super) yaw: f32,
    pub(super) pitch: f32,
    pub(super) distance: f32,
    pub(super) pan: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Projected {
    pub(super) screen: Pos2,
    /// Pixels per world unit at this depth.
    pub(super) scale: f32,
    pub(super) depth: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.35,
            distance: 70.0,
            pan: Vec2::ZERO,
        }
    }
}

impl Camera {
    fn rotation(&self) -> Mat3 {
        Mat3::from_rotation_x(self.pitch) * Mat3::from_rotation_y(self.yaw)
    }

    /// Perspective projection of `world` into `rect`. `None` when the point
    /// sits behind the near plane or is not finite.
    pub(super) fn project(&self, rect: Rect, world: Vec3) -> Option<Projected> {
        let view = self.rotation() * world;
        let depth = self.distance - view.z;
        if !depth.is_finite() || depth <= NEAR_PLANE {
            return None;
        }

        let focal = rect.height().max(1.0) * 0.9;
        let scale = focal / depth;
        let screen = rect.center() + self.pan + vec2(view.x * scale, -view.y * scale);
        if !screen.x.is_finite() || !screen.y.is_finite() {
            return None;
        }

        Some(Projected {
            screen,
            scale,
            depth,
        })
    }

    pub(super) fn orbit(&mut self, delta: Vec2) {
        self.yaw = (self.yaw + delta.x * ORBIT_SPEED).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + delta.y * ORBIT_SPEED).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub(super) fn spin(&mut self, angle: f32) {
        if angle.is_finite() {
            self.yaw = (self.yaw + angle).rem_euclid(std::f32::consts::TAU);
        }
    }

    pub(super) fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - (scroll * 0.0018)).clamp(0.85, 1.15);
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Pulls the camera back far enough to frame a network of `extent`.
    pub(super) fn frame(&mut self, extent: f32) {
        self.pan = Vec2::ZERO;
        self.distance = (extent * 2.4 + 20.0).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

pub(super) fn rgb_color(color: Rgb) -> Color32 {
    Color32::from_rgb(color.0, color.1, color.2)
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| ((a as f32 * (1.0 - amount)) + (b as f32 * amount)) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.35 + (factor * 0.65))) as u8,
    )
}

/// Dark backdrop with a sparse star field that drifts with the camera yaw.
pub(super) fn draw_background(painter: &Painter, rect: Rect, yaw: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(9, 12, 20));

    let drift = yaw / std::f32::consts::TAU;
    for index in 0..BACKGROUND_STARS {
        let (x, y) = stable_pair(&index.to_string());
        let u = ((x + 1.0) * 0.5 + drift).rem_euclid(1.0);
        let v = (y + 1.0) * 0.5;
        let position = Pos2::new(
            rect.left() + u * rect.width(),
            rect.top() + v * rect.height(),
        );
        let brightness = 60 + (index % 5) as u8 * 22;
        painter.circle_filled(
            position,
            0.6 + (index % 3) as f32 * 0.35,
            Color32::from_rgba_unmultiplied(brightness, brightness, brightness + 20, 160),
        );
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}
