//! In-memory [`Layer`] that records paint calls, for native tests.
//!
//! Instead of pixels it keeps a list of marks currently on the layer. Clearing
//! empties the list, compositing appends the source's marks, and snapshots
//! serialize the list so restore round-trips exactly.

use crate::coords::Size;
use crate::layer::{Composite, ImageSource, Layer, LayerError, Path, Pen, RasterSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Clear,
    Stroke { path: Path, pen: Pen },
    Fill { path: Path, color: String },
    DrawLayer { alpha: f64, marks: usize },
    DrawImage(String),
    Restore,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingLayer {
    width: u32,
    height: u32,
    pub ops: Vec<Op>,
    marks: Vec<String>,
    pub fail_images: bool,
}

impl RecordingLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, ..Self::default() }
    }

    /// Marks currently on the layer, oldest first.
    pub fn marks(&self) -> &[String] {
        &self.marks
    }

    pub fn strokes(&self) -> Vec<(&Path, &Pen)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Stroke { path, pen } => Some((path, pen)),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(&Path, &str)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Fill { path, color } => Some((path, color.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl Layer for RecordingLayer {
    type Image = ImageSource;

    fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.marks.clear();
    }

    fn clear(&mut self) {
        self.ops.push(Op::Clear);
        self.marks.clear();
    }

    fn stroke(&mut self, path: &Path, pen: &Pen) -> Result<(), LayerError> {
        self.ops.push(Op::Stroke { path: path.clone(), pen: pen.clone() });
        match pen.composite {
            Composite::SourceOver => self.marks.push(format!("stroke:{}", pen.color)),
            Composite::DestinationOut => self.marks.push("erase".to_owned()),
        }
        Ok(())
    }

    fn fill(&mut self, path: &Path, color: &str) -> Result<(), LayerError> {
        self.ops.push(Op::Fill { path: path.clone(), color: color.to_owned() });
        self.marks.push(format!("fill:{color}"));
        Ok(())
    }

    fn draw_layer(&mut self, src: &Self, alpha: f64) -> Result<(), LayerError> {
        self.ops.push(Op::DrawLayer { alpha, marks: src.marks.len() });
        self.marks.extend(src.marks.iter().cloned());
        Ok(())
    }

    fn draw_image(&mut self, src: &ImageSource) -> Result<(), LayerError> {
        if self.fail_images {
            return Err(LayerError::Image(src.url.clone()));
        }
        self.ops.push(Op::DrawImage(src.url.clone()));
        self.marks.push(format!("image:{}", src.url));
        Ok(())
    }

    fn snapshot(&self) -> Result<RasterSnapshot, LayerError> {
        Ok(RasterSnapshot {
            width: self.width,
            height: self.height,
            pixels: self.marks.join("\n").into_bytes(),
        })
    }

    fn restore(&mut self, snapshot: &RasterSnapshot) -> Result<(), LayerError> {
        if snapshot.width != self.width || snapshot.height != self.height {
            return Err(LayerError::SizeMismatch {
                got_w: snapshot.width,
                got_h: snapshot.height,
                want_w: self.width,
                want_h: self.height,
            });
        }
        let text = String::from_utf8(snapshot.pixels.clone()).map_err(|e| LayerError::Backend(e.to_string()))?;
        self.marks = text.lines().filter(|l| !l.is_empty()).map(str::to_owned).collect();
        self.ops.push(Op::Restore);
        Ok(())
    }

    fn encode(&self) -> Result<String, LayerError> {
        Ok(format!("data:test,{}", self.marks.join("|")))
    }

    fn has_ink(&self) -> Result<bool, LayerError> {
        Ok(self.marks.iter().any(|m| m != "erase"))
    }

    fn sibling(&self) -> Result<Self, LayerError> {
        Ok(Self::new(self.width, self.height))
    }
}
