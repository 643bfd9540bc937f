//! dwfx2pdf — transcodes a DWFx (XPS-in-OPC) fixed page into a PDF page.
//!
//! ```no_run
//! use std::path::Path;
//!
//! dwfx2pdf::convert(Path::new("drawing.dwfx"), Path::new("drawing.pdf")).unwrap();
//! ```
//!
//! The pipeline: [`package`] opens the ZIP/OPC container, [`xps::navigator`]
//! walks `FixedDocumentSequence` -> `FixedDocument` -> `PageContent` down to
//! the first `FixedPage`, [`xps::resources`] resolves that page's image
//! brushes and fonts (deobfuscating ODTTF parts along the way),
//! [`pathdata`] interprets `Path.Data` mini-language strings into
//! line/cubic segments, [`pdf::emitter`] lowers the page tree into a flat
//! `Op` list, and [`pdf::serialize`] turns that list into PDF bytes via
//! `lopdf`. [`convert`] and [`convert_with_options`] wire all of this
//! together; [`convert::ConvertOptions`] is re-exported as
//! [`ConvertOptions`].

pub mod convert;
pub mod errors;
pub mod font;
pub mod package;
pub mod pathdata;
pub mod pdf;
pub mod units;
pub mod xps;

pub use convert::{convert, convert_bytes, convert_with_options, ConvertOptions};
pub use errors::Error;
