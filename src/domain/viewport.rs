//! Pan/zoom transform between world and screen coordinates.

use serde::{Deserialize, Serialize};

use crate::domain::{ContainerSize, Position};

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;

/// Vertical offset of the world origin when nothing can be fitted.
const DEFAULT_TOP: f64 = 100.0;

/// Screen-space translation of the world origin plus zoom factor.
///
/// `screen = world * scale + (x, y)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

pub fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

impl Viewport {
    pub fn new(x: f64, y: f64, scale: f64) -> Self {
        Self {
            x,
            y,
            scale: clamp_scale(scale),
        }
    }

    /// Origin horizontally centered, near the top, unscaled.
    pub fn centered(container: ContainerSize) -> Self {
        let x = if container.width.is_finite() && container.width > 0.0 {
            container.width / 2.0
        } else {
            0.0
        };
        Self {
            x,
            y: DEFAULT_TOP,
            scale: 1.0,
        }
    }

    pub fn world_to_screen(&self, world: Position) -> Position {
        Position::new(world.x * self.scale + self.x, world.y * self.scale + self.y)
    }

    pub fn screen_to_world(&self, screen: Position) -> Position {
        Position::new((screen.x - self.x) / self.scale, (screen.y - self.y) / self.scale)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Rescale by `factor` keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Position, factor: f64) {
        let new_scale = clamp_scale(self.scale * factor);
        let ratio = new_scale / self.scale;
        self.x = anchor.x - (anchor.x - self.x) * ratio;
        self.y = anchor.y - (anchor.y - self.y) * ratio;
        self.scale = new_scale;
    }

    /// Mouse-wheel zoom: a positive delta zooms out.
    pub fn wheel(&mut self, anchor: Position, delta_y: f64, wheel_factor: f64) {
        let factor = if delta_y > 0.0 {
            1.0 / wheel_factor
        } else {
            wheel_factor
        };
        self.zoom_at(anchor, factor);
    }

    /// Rescale around the world origin's screen position; translation kept.
    pub fn zoom_by(&mut self, factor: f64) {
        self.scale = clamp_scale(self.scale * factor);
    }
}
