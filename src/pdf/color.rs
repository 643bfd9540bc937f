//! Color handling. Adapted from the teacher's `color.rs`: XPS brush/fill
//! colors are always `#RRGGBB` or `#AARRGGBB` hex strings (never
//! CMYK/spot colors), so this keeps only the `Rgb` variant of the
//! teacher's `Color` enum plus the `PdfColor`/`Operation` lowering shape.

use lopdf::content::Operation;
use lopdf::Object::Real;
use serde_derive::{Deserialize, Serialize};

pub const OP_COLOR_SET_FILL_CS_DEVICERGB: &str = "rg";
pub const OP_COLOR_SET_STROKE_CS_DEVICERGB: &str = "RG";

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    fn into_vec(self) -> Vec<f32> {
        vec![self.r, self.g, self.b]
    }

    /// Parses an XPS color string: `#RGB`, `#RRGGBB`, or `#AARRGGBB`
    /// (alpha is accepted but dropped — this spec has no transparency
    /// model, per the opacity-mask non-goal). Returns black on anything
    /// that doesn't parse, matching the emitter's best-effort posture.
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or(Self::new(0.0, 0.0, 0.0))
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        let s = s.trim().strip_prefix('#')?;
        let (r, g, b) = match s.len() {
            6 => (&s[0..2], &s[2..4], &s[4..6]),
            8 => (&s[2..4], &s[4..6], &s[6..8]),
            3 => {
                let r = u8::from_str_radix(&s[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&s[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&s[2..3].repeat(2), 16).ok()?;
                return Some(Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0));
            }
            _ => return None,
        };
        let r = u8::from_str_radix(r, 16).ok()?;
        let g = u8::from_str_radix(g, 16).ok()?;
        let b = u8::from_str_radix(b, 16).ok()?;
        Some(Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PdfColor {
    FillColor(Rgb),
    OutlineColor(Rgb),
}

impl From<PdfColor> for Operation {
    fn from(color: PdfColor) -> Self {
        let (key, rgb) = match color {
            PdfColor::FillColor(c) => (OP_COLOR_SET_FILL_CS_DEVICERGB, c),
            PdfColor::OutlineColor(c) => (OP_COLOR_SET_STROKE_CS_DEVICERGB, c),
        };
        Operation::new(key, rgb.into_vec().into_iter().map(Real).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_six_digit_hex() {
        assert_eq!(Rgb::parse("#FF0000"), Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn parses_eight_digit_hex_dropping_alpha() {
        assert_eq!(Rgb::parse("#80FF0000"), Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn parses_three_digit_hex() {
        assert_eq!(Rgb::parse("#0F0"), Rgb::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn default_black_on_empty() {
        assert_eq!(Rgb::try_parse(""), None);
        assert_eq!(Rgb::parse(""), Rgb::new(0.0, 0.0, 0.0));
    }
}

impl PartialEq for Rgb {
    fn eq(&self, other: &Self) -> bool {
        (self.r - other.r).abs() < 1e-4 && (self.g - other.g).abs() < 1e-4 && (self.b - other.b).abs() < 1e-4
    }
}
