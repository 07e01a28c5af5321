//! Icon sources and markup-level edits: loading, color handling,
//! recoloring, and the vector background wrap.

pub mod color;
pub mod source;
pub mod svg_edit;
