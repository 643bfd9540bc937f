//! Shared XPS markup types: the tagged-union element tree every XPS part
//! (FixedDocumentSequence, FixedDocument, FixedPage, ResourceDictionary)
//! is parsed into, plus the tolerant numeric parsing shared by
//! `Viewport`, `RenderTransform`, and `StrokeDashArray`.

pub mod navigator;
pub mod resources;

use std::collections::HashMap;
use xml::reader::{EventReader, XmlEvent};

/// Depth guard for [`parse`]. XPS canvases can nest arbitrarily; an
/// adversarial input shouldn't be able to blow the native call stack.
const MAX_DEPTH: usize = 256;

/// One node of a parsed XPS/OPC XML tree. Deliberately *not* a hierarchy
/// of per-tag structs — `Canvas`, `Path`, `Glyphs`, `ResourceDictionary`
/// and anything unrecognized all share this one shape, and dispatch on
/// `tag` happens where it's needed (navigator, resource resolver, emitter)
/// rather than via trait objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Local tag name, with any XML namespace prefix stripped (`x:Key`
    /// stays `x:Key` since that prefix is semantically meaningful here,
    /// but `{namespace}Tag`-style qualification from the `xml` crate is
    /// reduced to bare `Tag`).
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// Parses an XML document into a single root [`Element`]. Returns `None`
/// on malformed XML or if the document has no root element — callers
/// treat that as `PackageInvalid` or `ResourceMissing` depending on which
/// part failed.
pub fn parse(xml: &str) -> Option<Element> {
    let mut reader = EventReader::new(xml.as_bytes());
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.next() {
            Ok(XmlEvent::StartElement {
                name, attributes, ..
            }) => {
                if stack.len() >= MAX_DEPTH {
                    return root;
                }
                let mut attrs = HashMap::with_capacity(attributes.len());
                for a in attributes {
                    attrs.insert(a.name.local_name, a.value);
                }
                stack.push(Element {
                    tag: name.local_name,
                    attrs,
                    children: Vec::new(),
                });
            }
            Ok(XmlEvent::EndElement { .. }) => {
                if let Some(finished) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(finished),
                        None => root = Some(finished),
                    }
                }
            }
            Ok(XmlEvent::EndDocument) => break,
            Err(_) => break,
            _ => {}
        }
    }

    root
}

/// Parses XPS numeric attribute lists: comma *or* whitespace separated,
/// culture-invariant decimal points. Used for `RenderTransform` (6
/// numbers), `Viewport`/`Viewbox` (4 numbers), and `StrokeDashArray` (N
/// numbers). Non-numeric tokens are dropped rather than failing the
/// whole parse, matching the emitter's best-effort posture.
pub fn parse_numbers(s: &str) -> Vec<f64> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_builds_nested_tree() {
        let xml = r#"<FixedPage Width="960" Height="720"><Canvas><Path Fill="#FF0000"/></Canvas></FixedPage>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.tag, "FixedPage");
        assert_eq!(root.attr("Width"), Some("960"));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].tag, "Canvas");
        assert_eq!(root.children[0].children[0].tag, "Path");
    }

    #[test]
    fn parse_numbers_accepts_comma_separated() {
        assert_eq!(parse_numbers("0,0,200,150"), vec![0.0, 0.0, 200.0, 150.0]);
    }

    #[test]
    fn parse_numbers_accepts_whitespace_separated() {
        assert_eq!(parse_numbers("1 0 0 1 10 20"), vec![1.0, 0.0, 0.0, 1.0, 10.0, 20.0]);
    }

    #[test]
    fn parse_numbers_accepts_mixed_separators() {
        assert_eq!(parse_numbers("1, 0 0,1"), vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn parse_numbers_skips_non_numeric_tokens() {
        assert_eq!(parse_numbers("1 0 abc 1"), vec![1.0, 0.0, 1.0]);
    }
}
