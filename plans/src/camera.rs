#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use canvas::coords::{Point, Size, denormalize, normalize};

use crate::config::ViewerConfig;

/// Pan/zoom state of the floor-plan viewer.
///
/// `offset_x` / `offset_y` are in CSS pixels: where the plan image's top-left
/// corner sits on screen. `scale` maps native plan pixels to CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanCamera {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for PlanCamera {
    fn default() -> Self {
        Self { offset_x: 0.0, offset_y: 0.0, scale: 1.0 }
    }
}

impl PlanCamera {
    /// Centre `image` in `viewport`, scaled to fit. Never enlarges unless
    /// `upscale` is set.
    #[must_use]
    pub fn fit(viewport: Size, image: Size, upscale: bool) -> Self {
        if viewport.is_empty() || image.is_empty() {
            return Self::default();
        }
        let fit = (viewport.width / image.width).min(viewport.height / image.height);
        let scale = if upscale { fit } else { fit.min(1.0) };
        Self {
            offset_x: (viewport.width - image.width * scale) / 2.0,
            offset_y: (viewport.height - image.height * scale) / 2.0,
            scale,
        }
    }

    /// Native plan pixels to screen (CSS) pixels.
    #[must_use]
    pub fn plan_px_to_screen(&self, plan: Point) -> Point {
        Point {
            x: plan.x * self.scale + self.offset_x,
            y: plan.y * self.scale + self.offset_y,
        }
    }

    /// Screen (CSS) pixels to native plan pixels.
    #[must_use]
    pub fn screen_to_plan_px(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.offset_x) / self.scale,
            y: (screen.y - self.offset_y) / self.scale,
        }
    }

    /// Where a normalized pin position lands on screen for a plan of `image` size.
    #[must_use]
    pub fn plan_to_screen(&self, normalized: Point, image: Size) -> Point {
        self.plan_px_to_screen(denormalize(normalized, image.width, image.height))
    }

    /// Normalized plan position under a screen point, or `None` outside the plan.
    #[must_use]
    pub fn screen_to_plan(&self, screen: Point, image: Size) -> Option<Point> {
        if image.is_empty() || self.scale <= 0.0 {
            return None;
        }
        let p = normalize(self.screen_to_plan_px(screen), image.width, image.height);
        let inside = (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y);
        inside.then_some(p)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Zoom one wheel notch about `screen`, keeping the plan point under it
    /// fixed. Positive `wheel_dy` zooms out. Returns `false` when already at
    /// the limit.
    pub fn zoom_at(&mut self, screen: Point, wheel_dy: f64, config: &ViewerConfig) -> bool {
        let factor = if wheel_dy > 0.0 { config.zoom_out_factor } else { config.zoom_in_factor };
        let next = config.clamp_scale(self.scale * factor);
        if (next - self.scale).abs() < f64::EPSILON {
            return false;
        }
        let change = next / self.scale;
        self.offset_x = screen.x - (screen.x - self.offset_x) * change;
        self.offset_y = screen.y - (screen.y - self.offset_y) * change;
        self.scale = next;
        true
    }
}
