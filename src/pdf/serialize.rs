//! Lowers an [`EmittedPage`] (the `Op` list plus collected image/font
//! resources) into an actual `lopdf::Document` and serializes it to
//! bytes. Grounded in the teacher's `serialize.rs`
//! (`serialize_pdf_into_bytes`) for the overall document-assembly shape
//! — catalog, pages tree, trailer, `doc.compress()` — but without the
//! ICC-profile/OCG-layers/bookmarks machinery that file stubbed out and
//! which has no counterpart in this spec.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::font::LoadedFont;
use crate::pdf::emitter::EmittedPage;
use crate::pdf::graphics::{PaintMode, WindingOrder};
use crate::pdf::ops::{FontRef, Op, PathPoint, TextRun};

/// Options a caller can tune without touching conversion semantics.
/// Mirrors the teacher's `SaveOptions` (printpdf's `serialize.rs`).
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    pub optimize: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

pub fn serialize_page(page: &EmittedPage, opts: &SaveOptions) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let resources_id = doc.add_object(build_resources(&mut doc, page));

    let content_bytes = build_content_stream(page).encode().unwrap_or_default();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

    let media_box = vec![
        Object::Real(0.0),
        Object::Real(0.0),
        Object::Real(page.width_pt.0 as f32),
        Object::Real(page.height_pt.0 as f32),
    ];

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(pages_id));
    page_dict.set("MediaBox", Object::Array(media_box));
    page_dict.set("Resources", Object::Reference(resources_id));
    page_dict.set("Contents", Object::Reference(content_id));
    doc.objects.insert(page_id, Object::Dictionary(page_dict));

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages_dict.set("Count", Object::Integer(1));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);

    doc.trailer.set("Root", Object::Reference(catalog_id));

    if opts.optimize {
        doc.compress();
    }

    let mut bytes = Vec::new();
    // `save_to` only fails on an underlying io::Write error, which an
    // in-memory Vec never produces.
    doc.save_to(&mut bytes).expect("writing to an in-memory buffer cannot fail");
    bytes
}

fn build_resources(doc: &mut Document, page: &EmittedPage) -> Dictionary {
    let mut font_dict = Dictionary::new();
    font_dict.set("Helv", Object::Reference(doc.add_object(builtin_helvetica())));
    for font in &page.fonts {
        let font_id = doc.add_object(embedded_font_dict(doc, font));
        font_dict.set(font.name.clone(), Object::Reference(font_id));
    }

    let mut xobject_dict = Dictionary::new();
    for image in &page.images {
        let image_id = doc.add_object(image_xobject(image));
        xobject_dict.set(image.name.clone(), Object::Reference(image_id));
    }

    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(font_dict));
    resources.set("XObject", Object::Dictionary(xobject_dict));
    resources.set(
        "ProcSet",
        Object::Array(vec![
            Object::Name(b"PDF".to_vec()),
            Object::Name(b"Text".to_vec()),
            Object::Name(b"ImageC".to_vec()),
        ]),
    );
    resources
}

fn builtin_helvetica() -> Dictionary {
    let mut d = Dictionary::new();
    d.set("Type", Object::Name(b"Font".to_vec()));
    d.set("Subtype", Object::Name(b"Type1".to_vec()));
    d.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    d.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    d
}

/// Embeds a deobfuscated TrueType font as a Type0/CIDFontType2 composite
/// font with `Identity-H` encoding and `CIDToGIDMap /Identity` — the
/// glyph ids in the content stream are exactly this font's own glyph
/// ids, since the emitter resolved them via the font's own cmap with no
/// intervening shaping step.
fn embedded_font_dict(doc: &mut Document, font: &crate::pdf::emitter::EmbeddedFont) -> Dictionary {
    let parsed = LoadedFont::parse(font.bytes.clone());
    let (units_per_em, ascender, descender) = parsed
        .as_ref()
        .map(|f| (f.units_per_em as f64, f.ascender as f64, f.descender as f64))
        .unwrap_or((1000.0, 800.0, -200.0));
    let scale = 1000.0 / units_per_em;

    let font_file_id = doc.add_object(Stream::new(
        {
            let mut d = Dictionary::new();
            d.set("Length1", Object::Integer(font.bytes.len() as i64));
            d
        },
        font.bytes.clone(),
    ));

    let mut descriptor = Dictionary::new();
    descriptor.set("Type", Object::Name(b"FontDescriptor".to_vec()));
    descriptor.set("FontName", Object::Name(font.name.as_bytes().to_vec()));
    descriptor.set("Flags", Object::Integer(4));
    descriptor.set("FontBBox", Object::Array(vec![
        Object::Integer(0), Object::Integer((descender * scale) as i64),
        Object::Integer(1000), Object::Integer((ascender * scale) as i64),
    ]));
    descriptor.set("ItalicAngle", Object::Integer(0));
    descriptor.set("Ascent", Object::Real((ascender * scale) as f32));
    descriptor.set("Descent", Object::Real((descender * scale) as f32));
    descriptor.set("CapHeight", Object::Real((ascender * scale) as f32));
    descriptor.set("StemV", Object::Integer(80));
    descriptor.set("FontFile2", Object::Reference(font_file_id));
    let descriptor_id = doc.add_object(descriptor);

    let widths: Vec<Object> = font
        .used_glyph_ids
        .iter()
        .flat_map(|gid| {
            let w = parsed
                .as_ref()
                .and_then(|f| f.advance_width(*gid))
                .map(|w| (w as f64 * scale).round() as i64)
                .unwrap_or(500);
            vec![
                Object::Integer(*gid as i64),
                Object::Array(vec![Object::Integer(w)]),
            ]
        })
        .collect();

    let mut descendant = Dictionary::new();
    descendant.set("Type", Object::Name(b"Font".to_vec()));
    descendant.set("Subtype", Object::Name(b"CIDFontType2".to_vec()));
    descendant.set("BaseFont", Object::Name(font.name.as_bytes().to_vec()));
    descendant.set("CIDToGIDMap", Object::Name(b"Identity".to_vec()));
    descendant.set(
        "CIDSystemInfo",
        Object::Dictionary({
            let mut d = Dictionary::new();
            d.set("Registry", Object::string_literal("Adobe"));
            d.set("Ordering", Object::string_literal("Identity"));
            d.set("Supplement", Object::Integer(0));
            d
        }),
    );
    descendant.set("FontDescriptor", Object::Reference(descriptor_id));
    descendant.set("W", Object::Array(widths));
    let descendant_id = doc.add_object(descendant);

    let mut composite = Dictionary::new();
    composite.set("Type", Object::Name(b"Font".to_vec()));
    composite.set("Subtype", Object::Name(b"Type0".to_vec()));
    composite.set("BaseFont", Object::Name(font.name.as_bytes().to_vec()));
    composite.set("Encoding", Object::Name(b"Identity-H".to_vec()));
    composite.set("DescendantFonts", Object::Array(vec![Object::Reference(descendant_id)]));
    composite
}

fn image_xobject(image: &crate::pdf::emitter::EmbeddedImage) -> Stream {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(image.width as i64));
    dict.set("Height", Object::Integer(image.height as i64));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    Stream::new(dict, image.rgb8.clone())
}

fn build_content_stream(page: &EmittedPage) -> Content {
    let mut operations = Vec::new();
    for op in &page.ops {
        lower_op(op, &mut operations);
    }
    Content { operations }
}

fn lower_op(op: &Op, out: &mut Vec<Operation>) {
    match op {
        Op::SaveGraphicsState => out.push(Operation::new("q", vec![])),
        Op::RestoreGraphicsState => out.push(Operation::new("Q", vec![])),
        Op::SetTransformationMatrix { matrix } => out.push((*matrix).into()),
        Op::SetFillColor { col } => out.push((*col).into()),
        Op::SetOutlineColor { col } => out.push((*col).into()),
        Op::SetOutlineThickness { pt } => {
            out.push(Operation::new("w", vec![Object::Real(pt.0 as f32)]));
        }
        Op::SetLineDashPattern { dash } => match dash {
            Some(d) => out.push(Operation::new(
                "d",
                vec![
                    Object::Array(d.pattern.iter().map(|v| Object::Real(*v)).collect()),
                    Object::Real(d.offset),
                ],
            )),
            None => out.push(Operation::new("d", vec![Object::Array(vec![]), Object::Integer(0)])),
        },
        Op::SetLineJoinStyle { join } => out.push(Operation::new("j", vec![Object::Integer(join.id())])),
        Op::SetLineCapStyle { cap } => out.push(Operation::new("J", vec![Object::Integer(cap.id())])),
        Op::DrawPath { path } => {
            emit_path_construction(&path.points, path.is_closed, out);
            let op_str = match path.mode {
                PaintMode::Fill => path.winding_order.get_fill_op(),
                PaintMode::Stroke => "S",
                PaintMode::FillStroke => path.winding_order.get_fill_stroke_op(),
                PaintMode::Clip => path.winding_order.get_clip_op(),
            };
            out.push(Operation::new(op_str, vec![]));
        }
        Op::ClipToPath { path } => {
            emit_path_construction(&path.points, path.is_closed, out);
            out.push(Operation::new(path.winding_order.get_clip_op(), vec![]));
            out.push(Operation::new("n", vec![]));
        }
        Op::StartTextSection => out.push(Operation::new("BT", vec![])),
        Op::EndTextSection => out.push(Operation::new("ET", vec![])),
        Op::SetFontSize { size, font } => {
            let name = font_resource_name(font);
            out.push(Operation::new(
                "Tf",
                vec![Object::Name(name.into_bytes()), Object::Real(size.0 as f32)],
            ));
        }
        Op::SetTextCursor { x, y } => {
            out.push(Operation::new("Td", vec![Object::Real(x.0 as f32), Object::Real(y.0 as f32)]));
        }
        Op::WriteText { run, .. } => match run {
            TextRun::Unicode(text) => {
                out.push(Operation::new("Tj", vec![Object::string_literal(text.as_str())]));
            }
            TextRun::Glyphs(ids) => {
                let mut bytes = Vec::with_capacity(ids.len() * 2);
                for id in ids {
                    bytes.extend_from_slice(&id.to_be_bytes());
                }
                out.push(Operation::new("Tj", vec![Object::String(bytes, lopdf::StringFormat::Hexadecimal)]));
            }
        },
        Op::UseXObject { name, transform } => {
            out.push((*transform).into());
            out.push(Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]));
        }
    }
}

fn font_resource_name(font: &FontRef) -> String {
    match font {
        FontRef::Embedded(name) => name.clone(),
        FontRef::Builtin(_) => "Helv".to_string(),
    }
}

fn emit_path_construction(points: &[PathPoint], is_closed: bool, out: &mut Vec<Operation>) {
    for point in points {
        match *point {
            PathPoint::MoveTo(x, y) => out.push(Operation::new("m", vec![Object::Real(x as f32), Object::Real(y as f32)])),
            PathPoint::LineTo(x, y) => out.push(Operation::new("l", vec![Object::Real(x as f32), Object::Real(y as f32)])),
            PathPoint::CubicTo(x1, y1, x2, y2, x, y) => out.push(Operation::new(
                "c",
                vec![
                    Object::Real(x1 as f32),
                    Object::Real(y1 as f32),
                    Object::Real(x2 as f32),
                    Object::Real(y2 as f32),
                    Object::Real(x as f32),
                    Object::Real(y as f32),
                ],
            )),
        }
    }
    if is_closed {
        out.push(Operation::new("h", vec![]));
    }
}
