//! Package Navigator: walks FixedDocumentSequence -> FixedDocument ->
//! PageContent to enumerate page references. Grounded in the
//! `xps_resolve_url`/part-graph-walk shape of the `SV-stark-PDFbull`
//! FFI XPS model in the example pack, reworked into safe Rust with no
//! `unsafe`/FFI surface.

use crate::errors::Error;
use crate::package::{self, Package};
use crate::xps;

/// `{fpagePath, basePath}` — `fpagePath` addresses a FixedPage part,
/// `basePath` is its parent directory and is threaded through resource
/// resolution so that `ImageSource`/`FontUri`/`Source` references inside
/// that page resolve relative to the right directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRef {
    pub fpage_path: String,
    pub base_path: String,
}

/// Enumerates page references in document order. The emitter only ever
/// uses the first; everything after it exists so a future multi-page
/// mode (see spec's open question) has somewhere to iterate from.
pub fn find_pages(pkg: &mut Package) -> Result<Vec<PageRef>, Error> {
    let fdseq_xml = pkg.read_text("FixedDocumentSequence.fdseq").ok_or_else(|| {
        Error::PackageInvalid("missing FixedDocumentSequence.fdseq".to_string())
    })?;
    let fdseq = xps::parse(&fdseq_xml).ok_or_else(|| {
        Error::PackageInvalid("FixedDocumentSequence.fdseq is not valid XML".to_string())
    })?;

    let mut pages = Vec::new();

    for doc_ref in fdseq.children_named("DocumentReference") {
        let Some(source) = doc_ref.attr("Source") else {
            continue;
        };
        let fdoc_path = package::normalize(source);
        let Some(fdoc_xml) = pkg.read_text(&fdoc_path) else {
            // Silently skip entries that cannot be read (spec §4.2 step 2).
            continue;
        };
        let Some(fdoc) = xps::parse(&fdoc_xml) else {
            continue;
        };
        let fdoc_dir = package::dirname(&fdoc_path);

        for page_content in fdoc.children_named("PageContent") {
            let Some(source) = page_content.attr("Source") else {
                continue;
            };
            let fpage_path = package::resolve(&fdoc_dir, source);
            let base_path = package::dirname(&fpage_path);
            pages.push(PageRef {
                fpage_path,
                base_path,
            });
        }
    }

    Ok(pages)
}
