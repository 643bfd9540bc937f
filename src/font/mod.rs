//! Embedded TrueType font wrapper. Grounded in the teacher's `font.rs`
//! (`ParsedFont`/`FontMetrics`), but stripped down to what glyph-run text
//! emission needs: cmap codepoint lookup, advance widths, and the
//! handful of `head`/`hhea` metrics that go into a PDF `/FontDescriptor`.
//! The teacher's `allsorts`-based GSUB/GPOS shaping cache is dropped —
//! this spec explicitly excludes glyph-indices/shaping (see DESIGN.md).

use owned_ttf_parser::{AsFaceRef, Face, OwnedFace};

/// A parsed embeddable font face plus the metrics a simple (non-shaped)
/// text run needs to lay itself out.
pub struct LoadedFont {
    face: OwnedFace,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl LoadedFont {
    /// Parses a TrueType/OpenType font buffer (already deobfuscated, if
    /// it came from an ODTTF part). Returns `None` on a corrupt buffer —
    /// the caller treats that as `FontRegistrationFailed` and falls back
    /// to the default face.
    pub fn parse(bytes: Vec<u8>) -> Option<Self> {
        let owned = OwnedFace::from_vec(bytes, 0).ok()?;
        let (units_per_em, ascender, descender) = {
            let face: &Face = owned.as_face_ref();
            (face.units_per_em(), face.ascender(), face.descender())
        };
        Some(Self {
            face: owned,
            units_per_em,
            ascender,
            descender,
        })
    }

    fn face(&self) -> &Face {
        self.face.as_face_ref()
    }

    /// Maps a Unicode codepoint to a glyph id via the font's cmap table.
    pub fn glyph_index(&self, c: char) -> Option<u16> {
        self.face().glyph_index(c).map(|id| id.0)
    }

    /// Horizontal advance of a glyph, in font design units (divide by
    /// `units_per_em` and multiply by the point size to get PDF units).
    pub fn advance_width(&self, glyph_id: u16) -> Option<u16> {
        self.face().glyph_hor_advance(owned_ttf_parser::GlyphId(glyph_id))
    }

    /// Raw font bytes, for embedding as a PDF `FontFile2` stream.
    pub fn raw_bytes(&self) -> &[u8] {
        self.face.as_slice()
    }
}

#[cfg(test)]
mod tests {
    // No bundled test font ships with this crate (DWFx files embed their
    // own); `LoadedFont` correctness is covered indirectly via the
    // emitter's scenario 6 test (ODTTF deobfuscation + glyph emission)
    // using a minimal hand-built TrueType buffer would require a font
    // fixture generator out of scope here. `parse` returning `None` on
    // garbage bytes is covered instead, since that's the fallback path
    // the emitter depends on.
    use super::*;

    #[test]
    fn parse_rejects_garbage_bytes() {
        assert!(LoadedFont::parse(vec![0u8; 8]).is_none());
    }
}
