//! Package Reader: random-access view over the ZIP container that backs a
//! DWFx file. Every other component reads parts through this type; none
//! of them touch `zip::ZipArchive` directly.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use crate::errors::Error;

/// An open DWFx/XPS package. Holds the whole archive in memory (DWFx
/// files are small fixed-layout documents, not multi-gigabyte blobs) and
/// an index from normalized part path to ZIP entry index, built once at
/// open time so repeated lookups during navigation and resource
/// resolution don't rescan the central directory.
pub struct Package {
    archive: zip::ZipArchive<Cursor<Vec<u8>>>,
    index: HashMap<String, usize>,
}

impl Package {
    /// Opens a DWFx package from its raw bytes.
    pub fn open(bytes: Vec<u8>) -> Result<Self, Error> {
        let cursor = Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(cursor)
            .map_err(|e| Error::PackageInvalid(format!("not a valid ZIP container: {e}")))?;

        let mut index = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| Error::PackageInvalid(format!("corrupt ZIP entry: {e}")))?;
            index.insert(normalize(entry.name()), i);
        }

        Ok(Self { archive, index })
    }

    /// Reads a part's raw bytes, or `None` if the part doesn't exist.
    /// Absence is not an error here — callers decide whether a missing
    /// part is fatal (`PackageInvalid`) or recoverable (`ResourceMissing`).
    pub fn read_bytes(&mut self, path: &str) -> Option<Vec<u8>> {
        let idx = *self.index.get(&normalize(path))?;
        let mut entry = self.archive.by_index(idx).ok()?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf).ok()?;
        Some(buf)
    }

    /// Reads a part as UTF-8 text, or `None` if absent or not valid UTF-8.
    pub fn read_text(&mut self, path: &str) -> Option<String> {
        String::from_utf8(self.read_bytes(path)?).ok()
    }
}

/// Strips a single leading `./` and a single leading `/` before lookup.
/// Case is preserved; ZIP entry names are matched exact.
pub fn normalize(path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path);
    let path = path.strip_prefix('/').unwrap_or(path);
    path.to_string()
}

/// Resolves a (possibly relative) part reference against a base
/// directory, per the Package Part resolution rules: a leading `/`
/// denotes package-root absolute; otherwise the reference is joined
/// against `base_dir`.
pub fn resolve(base_dir: &str, reference: &str) -> String {
    let reference = reference.strip_prefix("./").unwrap_or(reference);
    if reference.starts_with('/') {
        return normalize(reference);
    }
    if base_dir.is_empty() {
        return normalize(reference);
    }
    normalize(&format!("{base_dir}/{reference}"))
}

/// The directory of a part path, `""` if the part is at package root.
pub fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => path[..i].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_one_leading_dot_slash() {
        assert_eq!(normalize("./Fonts/a.ttf"), "Fonts/a.ttf");
    }

    #[test]
    fn normalize_strips_one_leading_slash() {
        assert_eq!(normalize("/Fonts/a.ttf"), "Fonts/a.ttf");
    }

    #[test]
    fn normalize_preserves_case() {
        assert_eq!(normalize("Documents/1/Pages/1.fpage"), "Documents/1/Pages/1.fpage");
    }

    #[test]
    fn resolve_absolute_reference_ignores_base() {
        assert_eq!(resolve("Documents/1/Pages", "/Resources/img.png"), "Resources/img.png");
    }

    #[test]
    fn resolve_relative_reference_joins_base() {
        assert_eq!(resolve("Documents/1/Pages", "img.png"), "Documents/1/Pages/img.png");
    }

    #[test]
    fn resolve_relative_reference_strips_dot_slash() {
        assert_eq!(resolve("Documents/1/Pages", "./img.png"), "Documents/1/Pages/img.png");
    }

    #[test]
    fn dirname_of_root_level_part_is_empty() {
        assert_eq!(dirname("FixedDocumentSequence.fdseq"), "");
    }

    #[test]
    fn dirname_of_nested_part() {
        assert_eq!(dirname("Documents/1/Pages/1.fpage"), "Documents/1/Pages");
    }
}
