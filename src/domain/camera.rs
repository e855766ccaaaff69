use serde::{Deserialize, Serialize};

use crate::domain::card::Position;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
/// Wheel delta to exponential zoom factor.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.001;
/// Zoom used when the routine scheduler centers on the active card.
pub const FOCUS_ZOOM: f64 = 1.2;

/// A point in screen space (pixels, viewport top-left origin).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

/// The pan/zoom viewport transform. (x, y) is a translation applied after
/// shifting the coordinate origin to the viewport center; zoom is a uniform
/// scale clamped to [MIN_ZOOM, MAX_ZOOM].
///
/// World -> screen: `screen = viewport_center + world * zoom + (x, y)`.
/// Every coordinate conversion in the system goes through this one pair of
/// functions; call sites must not reimplement the transform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn world_to_screen(&self, world: Position, viewport: &Viewport) -> ScreenPoint {
        let center = viewport.center();
        ScreenPoint::new(
            center.x + world.x * self.zoom + self.x,
            center.y + world.y * self.zoom + self.y,
        )
    }

    pub fn screen_to_world(&self, screen: ScreenPoint, viewport: &Viewport) -> Position {
        let center = viewport.center();
        Position::new(
            (screen.x - center.x - self.x) / self.zoom,
            (screen.y - center.y - self.y) / self.zoom,
        )
    }

    /// Camera translation that puts `center` at the middle of the viewport.
    pub fn centered_on(center: Position, zoom: f64) -> Self {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        Self {
            x: -(center.x * zoom),
            y: -(center.y * zoom),
            zoom,
        }
    }

    /// Zoom-to-cursor: the world point under the cursor before the zoom
    /// stays under the cursor after it.
    pub fn zoom_at_cursor(
        &self,
        cursor: ScreenPoint,
        wheel_delta_y: f64,
        viewport: &Viewport,
    ) -> Self {
        let anchor = self.screen_to_world(cursor, viewport);
        let factor = (-wheel_delta_y * WHEEL_ZOOM_SENSITIVITY).exp();
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let center = viewport.center();
        Self {
            x: cursor.x - center.x - anchor.x * zoom,
            y: cursor.y - center.y - anchor.y * zoom,
            zoom,
        }
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self
    }

    pub fn panned_by(mut self, dx: f64, dy: f64) -> Self {
        // Panning is screen-space: the pointer delta is added directly.
        self.x += dx;
        self.y += dy;
        self
    }
}
