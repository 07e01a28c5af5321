//! Raster pipeline: backdrop plate, per-frame sprite transforms, and
//! premultiplied compositing.

pub mod backdrop;
pub mod composite;
pub mod frames;
