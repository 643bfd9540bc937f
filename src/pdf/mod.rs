//! PDF emission: the IR (`ops`), geometry/styling primitives
//! (`graphics`, `color`), the XPS-tree-to-IR lowering (`emitter`), and
//! the IR-to-`lopdf::Document` serializer (`serialize`).

pub mod color;
pub mod emitter;
pub mod graphics;
pub mod ops;
pub mod serialize;
