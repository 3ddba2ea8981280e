//! Renderer crate root.
//!
//! Turns a [`RenderScene`] snapshot into RGBA8 pixels one screen tile at a time.
//!
//! Internal architecture overview:
//! - `scene`: immutable per-cycle snapshot shared by every worker.
//! - `coverage`: distance-to-segment and anti-aliased coverage of one stroke.
//! - `rasterizer`: per-tile block walk, stroke culling and compositing.
//! - `raster_buffers`: the two screen-sized output buffers and the index flip.

mod coverage;
mod raster_buffers;
mod rasterizer;
mod scene;

pub use coverage::{coverage_at, distance_to_segment};
pub use raster_buffers::{RasterBufferError, RasterBuffers, RasterFrame};
pub use rasterizer::{TileScratch, rasterize_tile};
pub use scene::RenderScene;

/// Width of the soft edge around every stroke, in screen pixels.
pub const FEATHER_PX: i64 = 1;
