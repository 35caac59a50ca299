use crate::geom::Point;
use crate::path::Path;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rgba {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    /// Opacity in `0.0..=1.0`.
    pub(crate) a: f32,
}

impl Rgba {
    pub(crate) const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

pub(crate) const ORANGE: Rgba = Rgba::new(255, 165, 0, 0.9);
pub(crate) const ORANGE_FAINT: Rgba = Rgba::new(255, 165, 0, 0.3);
pub(crate) const GREEN: Rgba = Rgba::new(0, 255, 0, 0.9);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Stroke {
    pub(crate) color: Rgba,
    pub(crate) width: f64,
}

impl Stroke {
    pub(crate) const CIRCUIT: Stroke = Stroke {
        color: ORANGE,
        width: 1.5,
    };
    pub(crate) const OUTLINE: Stroke = Stroke {
        color: ORANGE_FAINT,
        width: 0.5,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TextStyle {
    pub(crate) color: Rgba,
    pub(crate) size_px: f64,
    /// Text is centered horizontally on the anchor when set.
    pub(crate) centered: bool,
}

/// The drawing primitives the generator is allowed to use.
pub(crate) trait Canvas {
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    fn stroke(&mut self, path: &Path, style: Stroke);
    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle);
}

#[derive(Clone, Debug)]
pub(crate) enum DrawOp {
    Clear,
    Stroke { path: Path, style: Stroke },
    Text { text: String, at: Point, style: TextStyle },
}

/// Canvas that only remembers what it was asked to draw.
#[derive(Clone, Debug, Default)]
pub(crate) struct Recorder {
    pub(crate) width: u32,
    pub(crate) height: u32,
    ops: Vec<DrawOp>,
}

impl Recorder {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub(crate) fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub(crate) fn strokes(&self) -> impl Iterator<Item = (&Path, &Stroke)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Stroke { path, style } => Some((path, style)),
            _ => None,
        })
    }

    pub(crate) fn texts(&self) -> impl Iterator<Item = (&str, Point)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, at, .. } => Some((text.as_str(), *at)),
            _ => None,
        })
    }

    /// Ops issued since the most recent clear.
    pub(crate) fn last_frame(&self) -> &[DrawOp] {
        match self.ops.iter().rposition(|op| matches!(op, DrawOp::Clear)) {
            Some(i) => &self.ops[i + 1..],
            None => &self.ops,
        }
    }
}

impl Canvas for Recorder {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn stroke(&mut self, path: &Path, style: Stroke) {
        self.ops.push(DrawOp::Stroke {
            path: path.clone(),
            style,
        });
    }

    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            style,
        });
    }
}
