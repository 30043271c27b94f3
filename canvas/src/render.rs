//! Browser implementation of [`Layer`] over an `HtmlCanvasElement`.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! Every paint call saves and restores the context, so pen state never leaks
//! from one call into the next. Fallible `Canvas2D` calls are mapped to
//! [`LayerError::Backend`].

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, ImageData};

use crate::coords::Size;
use crate::layer::{Layer, LayerError, Path, PathOp, Pen, RasterImage, RasterSnapshot};

impl RasterImage for HtmlImageElement {
    fn natural_size(&self) -> Size {
        Size::new(f64::from(self.natural_width()), f64::from(self.natural_height()))
    }
}

fn js(e: JsValue) -> LayerError {
    LayerError::Backend(format!("{e:?}"))
}

/// One canvas of the layer stack.
#[derive(Debug, Clone)]
pub struct CanvasLayer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasLayer {
    /// # Errors
    ///
    /// Fails if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, LayerError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(js)?
            .ok_or_else(|| LayerError::Backend("canvas has no 2d context".to_owned()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| LayerError::Backend("context is not CanvasRenderingContext2d".to_owned()))?;
        Ok(Self { canvas, ctx })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn width(&self) -> f64 {
        f64::from(self.canvas.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.canvas.height())
    }

    fn trace(&self, path: &Path) -> Result<(), LayerError> {
        self.ctx.begin_path();
        for op in path.ops() {
            match *op {
                PathOp::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathOp::LineTo(p) => self.ctx.line_to(p.x, p.y),
                PathOp::Rect { origin, width, height } => self.ctx.rect(origin.x, origin.y, width, height),
                PathOp::Ellipse { center, rx, ry } => {
                    self.ctx.move_to(center.x + rx, center.y);
                    self.ctx
                        .ellipse(center.x, center.y, rx, ry, 0.0, 0.0, std::f64::consts::TAU)
                        .map_err(js)?;
                }
                PathOp::Circle { center, radius } => {
                    self.ctx.move_to(center.x + radius, center.y);
                    self.ctx
                        .arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU)
                        .map_err(js)?;
                }
            }
        }
        Ok(())
    }

    fn apply_pen(&self, pen: &Pen) -> Result<(), LayerError> {
        self.ctx.set_stroke_style_str(&pen.color);
        self.ctx.set_line_width(pen.width);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.set_global_alpha(pen.alpha);
        self.ctx.set_global_composite_operation(pen.composite.as_css()).map_err(js)?;
        let dash = js_sys::Array::new();
        for d in &pen.dash {
            dash.push(&JsValue::from_f64(*d));
        }
        self.ctx.set_line_dash(&dash).map_err(js)
    }

    fn image_data(&self) -> Result<ImageData, LayerError> {
        self.ctx.get_image_data(0.0, 0.0, self.width(), self.height()).map_err(js)
    }
}

impl Layer for CanvasLayer {
    type Image = HtmlImageElement;

    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width(), self.height());
    }

    fn stroke(&mut self, path: &Path, pen: &Pen) -> Result<(), LayerError> {
        self.ctx.save();
        let result = self.apply_pen(pen).and_then(|()| self.trace(path));
        if result.is_ok() {
            self.ctx.stroke();
        }
        self.ctx.restore();
        result
    }

    fn fill(&mut self, path: &Path, color: &str) -> Result<(), LayerError> {
        self.ctx.save();
        self.ctx.set_fill_style_str(color);
        let result = self.trace(path);
        if result.is_ok() {
            self.ctx.fill();
        }
        self.ctx.restore();
        result
    }

    fn draw_layer(&mut self, src: &Self, alpha: f64) -> Result<(), LayerError> {
        self.ctx.save();
        self.ctx.set_global_alpha(alpha);
        let result = self
            .ctx
            .draw_image_with_html_canvas_element(&src.canvas, 0.0, 0.0)
            .map_err(js);
        self.ctx.restore();
        result
    }

    fn draw_image(&mut self, image: &HtmlImageElement) -> Result<(), LayerError> {
        if !image.complete() || image.natural_width() == 0 {
            return Err(LayerError::Image(image.src()));
        }
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(image, 0.0, 0.0, self.width(), self.height())
            .map_err(js)
    }

    fn snapshot(&self) -> Result<RasterSnapshot, LayerError> {
        let data = self.image_data()?;
        Ok(RasterSnapshot { width: data.width(), height: data.height(), pixels: data.data().0 })
    }

    fn restore(&mut self, snapshot: &RasterSnapshot) -> Result<(), LayerError> {
        let (want_w, want_h) = (self.canvas.width(), self.canvas.height());
        if snapshot.width != want_w || snapshot.height != want_h {
            return Err(LayerError::SizeMismatch {
                got_w: snapshot.width,
                got_h: snapshot.height,
                want_w,
                want_h,
            });
        }
        let mut pixels = snapshot.pixels.clone();
        let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(&mut pixels), snapshot.width, snapshot.height)
            .map_err(js)?;
        self.ctx.put_image_data(&data, 0.0, 0.0).map_err(js)
    }

    fn encode(&self) -> Result<String, LayerError> {
        self.canvas.to_data_url_with_type("image/png").map_err(js)
    }

    fn has_ink(&self) -> Result<bool, LayerError> {
        let pixels = self.image_data()?.data().0;
        Ok(pixels.chunks_exact(4).any(|px| px[3] != 0))
    }

    fn sibling(&self) -> Result<Self, LayerError> {
        let canvas = self
            .canvas
            .owner_document()
            .ok_or_else(|| LayerError::Backend("canvas is detached from a document".to_owned()))?
            .create_element("canvas")
            .map_err(js)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| LayerError::Backend("created element is not a canvas".to_owned()))?;
        canvas.set_width(self.canvas.width());
        canvas.set_height(self.canvas.height());
        Self::new(canvas)
    }
}
