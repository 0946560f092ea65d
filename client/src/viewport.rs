use crate::config::{MAX_ZOOM, MIN_ZOOM, WORLD_HALF_EXTENT};

/// Pan/zoom transform from galaxy coordinates to canvas pixels.
///
/// Galaxy y grows upward, screen y grows downward. `scale` is pixels per
/// world unit and `zoom()` is its base-2 log, so zoom levels line up with the
/// tier thresholds used by markers and labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    pub width: f64,
    pub height: f64,
}

const ZOOM_SENSITIVITY: f64 = 0.001;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 600.0,
            offset_y: 400.0,
            scale: 2f64.powf(crate::config::INITIAL_ZOOM),
            width: 1200.0,
            height: 800.0,
        }
    }
}

/// Axis-aligned world rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl WorldRect {
    pub fn around(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let mut rect = Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        };
        for (x, y) in iter {
            rect.min_x = rect.min_x.min(x);
            rect.min_y = rect.min_y.min(y);
            rect.max_x = rect.max_x.max(x);
            rect.max_y = rect.max_y.max(y);
        }
        Some(rect)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

fn min_scale() -> f64 {
    2f64.powf(MIN_ZOOM)
}

fn max_scale() -> f64 {
    2f64.powf(MAX_ZOOM)
}

impl Viewport {
    pub fn zoom(&self) -> f64 {
        self.scale.log2()
    }

    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            -wy * self.scale + self.offset_y,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            -(sy - self.offset_y) / self.scale,
        )
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.width = width;
            self.height = height;
        }
    }

    pub fn screen_contains(&self, sx: f64, sy: f64) -> bool {
        sx >= 0.0 && sx <= self.width && sy >= 0.0 && sy <= self.height
    }

    /// World rectangle currently on screen.
    pub fn visible_world(&self) -> WorldRect {
        let (x0, y0) = self.screen_to_world(0.0, self.height);
        let (x1, y1) = self.screen_to_world(self.width, 0.0);
        WorldRect {
            min_x: x0,
            min_y: y0,
            max_x: x1,
            max_y: y1,
        }
    }

    /// Zoom toward a focus point (screen coordinates).
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(min_scale(), max_scale());
        let ratio = new_scale / self.scale;

        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
        self.clamp_to_world();
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
        self.clamp_to_world();
    }

    /// Center on a world point at an explicit zoom level.
    pub fn set_view(&mut self, wx: f64, wy: f64, zoom: f64) {
        self.scale = 2f64.powf(zoom.clamp(MIN_ZOOM, MAX_ZOOM));
        self.offset_x = self.width / 2.0 - wx * self.scale;
        self.offset_y = self.height / 2.0 + wy * self.scale;
    }

    /// Fit `rect` into the canvas leaving `padding_px` on every side. A
    /// degenerate rect (single point) centers at the maximum zoom.
    pub fn fit_bounds(&mut self, rect: WorldRect, padding_px: f64) {
        let world_w = rect.max_x - rect.min_x;
        let world_h = rect.max_y - rect.min_y;
        let avail_w = (self.width - padding_px * 2.0).max(1.0);
        let avail_h = (self.height - padding_px * 2.0).max(1.0);

        let scale = if world_w <= 0.0 && world_h <= 0.0 {
            max_scale()
        } else {
            let sx = if world_w > 0.0 { avail_w / world_w } else { f64::MAX };
            let sy = if world_h > 0.0 { avail_h / world_h } else { f64::MAX };
            sx.min(sy)
        };
        self.scale = scale.clamp(min_scale(), max_scale());

        let center_x = (rect.min_x + rect.max_x) / 2.0;
        let center_y = (rect.min_y + rect.max_y) / 2.0;
        self.offset_x = self.width / 2.0 - center_x * self.scale;
        self.offset_y = self.height / 2.0 + center_y * self.scale;
    }

    /// Keep the view center inside the pannable world square.
    fn clamp_to_world(&mut self) {
        let (cx, cy) = self.screen_to_world(self.width / 2.0, self.height / 2.0);
        let clamped_x = cx.clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT);
        let clamped_y = cy.clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT);
        if clamped_x != cx || clamped_y != cy {
            self.offset_x = self.width / 2.0 - clamped_x * self.scale;
            self.offset_y = self.height / 2.0 + clamped_y * self.scale;
        }
    }
}
