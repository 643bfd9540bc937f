//! Unit newtypes: XPS documents are authored in 1/96 inch, PDF pages are
//! sized in 1/72 inch (points). `XpsUnit` and `Pt` keep the two from being
//! mixed up by accident; the scale factor between them is the single
//! constant [`XPS_TO_PT`].

use serde_derive::{Deserialize, Serialize};

/// 72/96: the one and only global scale applied to an XPS document on its
/// way into a PDF page, per spec invariant. Never re-derived elsewhere.
pub const XPS_TO_PT: f64 = 72.0 / 96.0;

/// A length in PDF points (1/72 inch).
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct Pt(pub f64);

/// A length in XPS units (1/96 inch), as it appears in `Width`, `Height`,
/// path-data coordinates, and `Viewport`/`Viewbox` numbers.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct XpsUnit(pub f64);

impl XpsUnit {
    pub fn into_pt(self) -> Pt {
        Pt(self.0 * XPS_TO_PT)
    }
}

impl Pt {
    pub fn into_xps_unit(self) -> XpsUnit {
        XpsUnit(self.0 / XPS_TO_PT)
    }
}

impl PartialEq for Pt {
    fn eq(&self, other: &Self) -> bool {
        (self.0 * 1000.0).round() == (other.0 * 1000.0).round()
    }
}

impl PartialEq for XpsUnit {
    fn eq(&self, other: &Self) -> bool {
        (self.0 * 1000.0).round() == (other.0 * 1000.0).round()
    }
}

impl From<Pt> for lopdf::Object {
    fn from(value: Pt) -> Self {
        lopdf::Object::Real(value.0 as f32)
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt(self.0 - rhs.0)
    }
}

impl std::ops::Mul<f64> for Pt {
    type Output = Pt;
    fn mul(self, rhs: f64) -> Pt {
        Pt(self.0 * rhs)
    }
}
