//! Errors for dwfx2pdf

use std::error::Error as IError;
use std::fmt;
use std::io::Error as IoError;

/// error_chain and failure are certainly nice, but completely overengineered
/// for this use-case. For example, neither of them allow error localization.
/// Additionally, debugging macros can get hairy really quick and matching with
/// `*e.kind()` or doing From conversions for other errors is really hard to do.
///
/// So in this case, the best form of error handling is to use the simple Rust-native
/// way: Just enums, `From` + pattern matching. No macros, except for this one.
///
/// What this macro does is (simplified): `impl From<$a> for $b { $b::$variant(error) }`
macro_rules! impl_from {
    ($from:ident, $to:ident::$variant:ident) => {
        impl From<$from> for $to {
            fn from(err: $from) -> Self {
                $to::$variant(err.into())
            }
        }
    };
}

/// Top-level error returned by [`crate::convert`].
///
/// Only the fatal kinds from the error taxonomy ever reach a caller.
/// `ResourceMissing`, `MalformedPathData`, `FontRegistrationFailed` and
/// `GlyphEmissionFailed` are recovered internally by the emitter (logged
/// at `warn` and the affected element is skipped) and never constructed
/// as a variant of this type.
#[derive(Debug)]
pub enum Error {
    /// ZIP container could not be opened, or a required part
    /// (`FixedDocumentSequence.fdseq`, the first `FixedPage`) is missing
    /// or unreadable.
    PackageInvalid(String),
    /// The package navigator found zero page references.
    NoPages,
    /// The output sink rejected the finished PDF bytes.
    OutputWriteFailed(IoError),
}

impl_from!(IoError, Error::OutputWriteFailed);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Error::*;
        match self {
            PackageInvalid(detail) => write!(f, "Conversion failed: {detail}"),
            NoPages => write!(f, "No pages found in DWFx file"),
            OutputWriteFailed(e) => write!(f, "Conversion failed: {e}"),
        }
    }
}

impl IError for Error {}

/// Recovered-error kinds (spec §7). These never escape the emitter: each
/// site that would produce one logs a `warn!` and degrades gracefully
/// instead of returning `Err` to the caller. Kept as a type (rather than
/// inlined `warn!` call sites) so call sites read as intent, not prose.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Recovered {
    ResourceMissing,
    MalformedPathData,
    FontRegistrationFailed,
    GlyphEmissionFailed,
}

impl fmt::Display for Recovered {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Recovered::*;
        write!(
            f,
            "{}",
            match self {
                ResourceMissing => "resource missing",
                MalformedPathData => "malformed path data",
                FontRegistrationFailed => "font registration failed",
                GlyphEmissionFailed => "glyph emission failed",
            }
        )
    }
}

/// Logs a recovered error with its context and drops it. Call sites read
/// `recover(Recovered::ResourceMissing, &format!("image key {key}"))`.
pub(crate) fn recover(kind: Recovered, context: &str) {
    log::warn!("{kind}: {context}, skipping");
}
