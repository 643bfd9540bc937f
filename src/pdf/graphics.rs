//! Geometric and styling primitives for PDF content-stream emission.
//! Adapted from the teacher's `graphics.rs` (`Rect`/`Point`/`WindingOrder`/
//! `PaintMode`/`LineCapStyle`/`LineJoinStyle`/`LineDashPattern`), trimmed
//! to what this spec's stroke/fill/clip rules need — no
//! `ExtendedGraphicsState`/blend-mode/halftone machinery, since none of
//! that has an XPS counterpart this crate emits.

use crate::units::Pt;
use serde_derive::{Deserialize, Serialize};

pub const OP_PATH_PAINT_FILL_NZ: &str = "f";
pub const OP_PATH_PAINT_FILL_EO: &str = "f*";
pub const OP_PATH_PAINT_FILL_STROKE_NZ: &str = "B";
pub const OP_PATH_PAINT_FILL_STROKE_EO: &str = "B*";
pub const OP_PATH_PAINT_STROKE: &str = "S";
pub const OP_PATH_CONST_CLIP_NZ: &str = "W";
pub const OP_PATH_CONST_CLIP_EO: &str = "W*";
pub const OP_PATH_PAINT_END: &str = "n";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindingOrder {
    EvenOdd,
    NonZero,
}

impl Default for WindingOrder {
    fn default() -> Self {
        WindingOrder::NonZero
    }
}

impl WindingOrder {
    pub fn get_clip_op(&self) -> &'static str {
        match self {
            WindingOrder::NonZero => OP_PATH_CONST_CLIP_NZ,
            WindingOrder::EvenOdd => OP_PATH_CONST_CLIP_EO,
        }
    }
    pub fn get_fill_op(&self) -> &'static str {
        match self {
            WindingOrder::NonZero => OP_PATH_PAINT_FILL_NZ,
            WindingOrder::EvenOdd => OP_PATH_PAINT_FILL_EO,
        }
    }
    pub fn get_fill_stroke_op(&self) -> &'static str {
        match self {
            WindingOrder::NonZero => OP_PATH_PAINT_FILL_STROKE_NZ,
            WindingOrder::EvenOdd => OP_PATH_PAINT_FILL_STROKE_EO,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaintMode {
    Clip,
    Fill,
    Stroke,
    FillStroke,
}

impl Default for PaintMode {
    fn default() -> Self {
        PaintMode::Fill
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineCapStyle {
    Butt,
    Round,
    ProjectingSquare,
}

impl LineCapStyle {
    pub fn id(&self) -> i64 {
        match self {
            LineCapStyle::Butt => 0,
            LineCapStyle::Round => 1,
            LineCapStyle::ProjectingSquare => 2,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineJoinStyle {
    Miter,
    Round,
    Bevel,
}

impl LineJoinStyle {
    pub fn id(&self) -> i64 {
        match self {
            LineJoinStyle::Miter => 0,
            LineJoinStyle::Round => 1,
            LineJoinStyle::Bevel => 2,
        }
    }
}

/// `D` dash pattern: an array of on/off lengths (already scaled by
/// stroke thickness per spec's stroke-styling rule) plus a phase offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDashPattern {
    pub offset: f32,
    pub pattern: Vec<f32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Pt,
    pub y: Pt,
}

/// A 2D point in the PDF emitter's replayed path (post path-data
/// interpretation, still pre-scale — the emitter applies `XPS_TO_PT` when
/// lowering into `cm`/path-construction operators, not here).
impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x: Pt(x), y: Pt(y) }
    }
}

/// Axis-aligned rectangle, used for the page's media/trim/crop boxes.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

impl Rect {
    pub fn from_wh(width: Pt, height: Pt) -> Self {
        Self {
            x: Pt(0.0),
            y: Pt(0.0),
            width,
            height,
        }
    }

    pub fn to_array(&self) -> Vec<lopdf::Object> {
        vec![
            lopdf::Object::Real(self.x.0 as f32),
            lopdf::Object::Real(self.y.0 as f32),
            lopdf::Object::Real((self.x.0 + self.width.0) as f32),
            lopdf::Object::Real((self.y.0 + self.height.0) as f32),
        ]
    }
}
