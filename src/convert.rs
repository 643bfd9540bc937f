//! Top-level conversion entry point: DWFx bytes in, PDF bytes out.
//! Wires the navigator, resource resolver, emitter and serializer
//! together in the order spec §4 lays out the pipeline. Grounded in the
//! teacher's `pdf_document.rs::save`/`save_to` shape for the "open,
//! build, serialize, write" outline, though none of its layer/page
//! bookkeeping carries over — this crate converts exactly one page.

use std::fs;
use std::path::Path;

use crate::errors::Error;
use crate::pdf::serialize::{self, SaveOptions};
use crate::pdf::emitter;
use crate::package::Package;
use crate::units::XpsUnit;
use crate::xps::{self, navigator, resources};

/// Caller-tunable knobs that don't change conversion semantics.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Whether the output PDF's streams/object table are compressed.
    /// Mirrors the teacher's `SaveOptions::optimize`.
    pub optimize: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Converts a DWFx file on disk at `input_path` into a PDF written to
/// `output_path`, using [`ConvertOptions::default`].
pub fn convert(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    convert_with_options(input_path, output_path, &ConvertOptions::default())
}

/// Same as [`convert`], with explicit output options.
pub fn convert_with_options(input_path: &Path, output_path: &Path, opts: &ConvertOptions) -> Result<(), Error> {
    let input_bytes = fs::read(input_path).map_err(Error::OutputWriteFailed)?;
    let output_bytes = convert_bytes(input_bytes, opts)?;
    fs::write(output_path, output_bytes).map_err(Error::OutputWriteFailed)
}

/// Converts a DWFx package already in memory into PDF bytes. This is the
/// pipeline proper: [`convert`]/[`convert_with_options`] are thin
/// filesystem wrappers around it.
pub fn convert_bytes(input_bytes: Vec<u8>, opts: &ConvertOptions) -> Result<Vec<u8>, Error> {
    let mut pkg = Package::open(input_bytes)?;

    let pages = navigator::find_pages(&mut pkg)?;
    let first = pages.first().ok_or(Error::NoPages)?.clone();

    let page_xml = pkg
        .read_text(&first.fpage_path)
        .ok_or_else(|| Error::PackageInvalid(format!("unreadable FixedPage part: {}", first.fpage_path)))?;
    let page_el = xps::parse(&page_xml)
        .ok_or_else(|| Error::PackageInvalid(format!("FixedPage part is not valid XML: {}", first.fpage_path)))?;

    let width = page_el
        .attr("Width")
        .and_then(|s| s.parse::<f64>().ok())
        .map(XpsUnit)
        .unwrap_or(XpsUnit(96.0 * 8.5));
    let height = page_el
        .attr("Height")
        .and_then(|s| s.parse::<f64>().ok())
        .map(XpsUnit)
        .unwrap_or(XpsUnit(96.0 * 11.0));

    let table = resources::collect(&mut pkg, &page_el, &first.base_path);
    let emitted = emitter::emit_page(&mut pkg, &page_el, &table, width, height);

    let save_opts = SaveOptions { optimize: opts.optimize };
    Ok(serialize::serialize_page(&emitted, &save_opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn build_dwfx() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();

            zip.start_file("FixedDocumentSequence.fdseq", options).unwrap();
            zip.write_all(br#"<FixedDocumentSequence><DocumentReference Source="/FixedDocument.fdoc"/></FixedDocumentSequence>"#).unwrap();

            zip.start_file("FixedDocument.fdoc", options).unwrap();
            zip.write_all(br#"<FixedDocument><PageContent Source="/Pages/1.fpage"/></FixedDocument>"#).unwrap();

            zip.start_file("Pages/1.fpage", options).unwrap();
            zip.write_all(br#"<FixedPage Width="200" Height="150"><Path Fill="#FF0000" Data="M 10,10 L 190,10 L 190,140 L 10,140 Z"/></FixedPage>"#).unwrap();

            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn converts_a_minimal_package_into_pdf_bytes() {
        let bytes = build_dwfx();
        let pdf = convert_bytes(bytes, &ConvertOptions::default()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn missing_fdseq_is_a_package_invalid_error() {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let zip = zip::ZipWriter::new(cursor);
            zip.finish().unwrap();
        }
        let err = convert_bytes(buf, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, Error::PackageInvalid(_)));
    }
}
