//! Raster painting core.
//! Internal architecture overview:
//! - `canvas`: the update-cycle context object owning view, strokes, buffers and workers.
//! - `config`: startup configuration and its validation.
//! - `picker`: the color picker seam and a headless stand-in.
//! - `report`: per-cycle outcome and recoverable warnings.

mod canvas;
mod config;
mod picker;
mod report;

pub use canvas::{CanvasCore, Mode};
pub use config::{
    CoreConfig, CoreConfigError, DEFAULT_BLOCK_WIDTH, DEFAULT_BLOCKS_PER_TILE,
    DEFAULT_BRUSH_ALPHA, DEFAULT_BRUSH_SIZE_PX, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH,
    DEFAULT_PICKER_HSV,
};
pub use picker::{ColorPicker, NoPicker, PickResult};
pub use report::{UpdateReport, UpdateWarning};
