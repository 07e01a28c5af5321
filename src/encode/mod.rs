//! Output encoders. Bitmaps stay premultiplied until they cross into an
//! encoder here.

pub mod animated;
pub mod still;
