use std::fmt;

use document::{DEFAULT_MAX_STROKE_POINTS, DEFAULT_MAX_STROKES, StrokeStoreConfig};
use engine::{RenderQueueError, default_worker_count};
use frame_scheduler::FrameSchedulerConfig;
use model::{Hsv, Vec2i};
use view::{DEFAULT_CANVAS_TILE_RADIUS, DEFAULT_SCALE, ViewConfig, ViewError, ZoomConfig};

pub const DEFAULT_MAX_WIDTH: i32 = 7680;
pub const DEFAULT_MAX_HEIGHT: i32 = 4320;
pub const DEFAULT_BLOCK_WIDTH: u32 = 32;
pub const DEFAULT_BLOCKS_PER_TILE: u32 = 16;
pub const DEFAULT_BRUSH_SIZE_PX: i64 = 10;
pub const DEFAULT_BRUSH_ALPHA: f32 = 0.5;
pub const DEFAULT_PICKER_HSV: Hsv = Hsv::new(0.0, 1.0, 0.7);

/// Startup configuration of a [`crate::CanvasCore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreConfig {
    /// Largest screen the raster buffers can hold.
    pub max_width: i32,
    pub max_height: i32,
    pub block_width: u32,
    pub blocks_per_tile: u32,
    pub worker_count: usize,
    pub max_strokes: usize,
    pub max_stroke_points: usize,
    /// Brush radius in screen pixels; canvas radius follows the zoom.
    pub brush_size_px: i64,
    pub brush_alpha: f32,
    pub initial_scale: i64,
    pub canvas_tile_radius: i64,
    pub picker_hsv: Hsv,
    pub zoom: ZoomConfig,
    pub scheduler: FrameSchedulerConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            block_width: DEFAULT_BLOCK_WIDTH,
            blocks_per_tile: DEFAULT_BLOCKS_PER_TILE,
            worker_count: default_worker_count(),
            max_strokes: DEFAULT_MAX_STROKES,
            max_stroke_points: DEFAULT_MAX_STROKE_POINTS,
            brush_size_px: DEFAULT_BRUSH_SIZE_PX,
            brush_alpha: DEFAULT_BRUSH_ALPHA,
            initial_scale: DEFAULT_SCALE,
            canvas_tile_radius: DEFAULT_CANVAS_TILE_RADIUS,
            picker_hsv: DEFAULT_PICKER_HSV,
            zoom: ZoomConfig::default(),
            scheduler: FrameSchedulerConfig::default(),
        }
    }
}

impl CoreConfig {
    pub fn max_screen_size(&self) -> Vec2i {
        Vec2i::new(self.max_width, self.max_height)
    }

    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            max_screen_size: self.max_screen_size(),
            initial_scale: self.initial_scale,
            canvas_tile_radius: self.canvas_tile_radius,
            zoom: self.zoom,
        }
    }

    pub fn stroke_store_config(&self) -> StrokeStoreConfig {
        StrokeStoreConfig {
            max_strokes: self.max_strokes,
            max_stroke_points: self.max_stroke_points,
        }
    }

    pub fn validate(&self) -> Result<(), CoreConfigError> {
        if self.max_width < 0 || self.max_height < 0 {
            return Err(CoreConfigError::NegativeMaxSize);
        }
        if self.block_width == 0 || self.blocks_per_tile == 0 {
            return Err(CoreConfigError::EmptyTile);
        }
        if self.block_width.checked_mul(self.blocks_per_tile).is_none() {
            return Err(CoreConfigError::EmptyTile);
        }
        if self.max_strokes == 0 || self.max_stroke_points == 0 {
            return Err(CoreConfigError::ZeroStrokeCapacity);
        }
        if self.brush_size_px < 0 {
            return Err(CoreConfigError::NegativeBrushSize);
        }
        if !(0.0..=1.0).contains(&self.brush_alpha) {
            return Err(CoreConfigError::BrushAlphaOutOfRange);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreConfigError {
    NegativeMaxSize,
    EmptyTile,
    ZeroStrokeCapacity,
    NegativeBrushSize,
    BrushAlphaOutOfRange,
    View(ViewError),
    RenderQueue(RenderQueueError),
}

impl fmt::Display for CoreConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreConfigError::NegativeMaxSize => {
                write!(formatter, "maximum raster size must not be negative")
            }
            CoreConfigError::EmptyTile => write!(
                formatter,
                "block width and blocks per tile must be positive and fit a u32 tile width"
            ),
            CoreConfigError::ZeroStrokeCapacity => {
                write!(formatter, "stroke and point capacities must be positive")
            }
            CoreConfigError::NegativeBrushSize => {
                write!(formatter, "brush size must not be negative")
            }
            CoreConfigError::BrushAlphaOutOfRange => {
                write!(formatter, "brush alpha must lie in [0, 1]")
            }
            CoreConfigError::View(error) => write!(formatter, "view config: {error}"),
            CoreConfigError::RenderQueue(error) => write!(formatter, "render queue: {error}"),
        }
    }
}

impl std::error::Error for CoreConfigError {}

impl From<ViewError> for CoreConfigError {
    fn from(error: ViewError) -> Self {
        Self::View(error)
    }
}

impl From<RenderQueueError> for CoreConfigError {
    fn from(error: RenderQueueError) -> Self {
        Self::RenderQueue(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(CoreConfig::default().validate(), Ok(()));
        assert_eq!(CoreConfig::default().max_screen_size(), Vec2i::new(7680, 4320));
    }

    #[test]
    fn validation_names_the_bad_field() {
        let config = CoreConfig {
            block_width: 0,
            ..CoreConfig::default()
        };
        assert_eq!(config.validate(), Err(CoreConfigError::EmptyTile));

        let config = CoreConfig {
            brush_alpha: 1.5,
            ..CoreConfig::default()
        };
        assert_eq!(config.validate(), Err(CoreConfigError::BrushAlphaOutOfRange));

        let config = CoreConfig {
            max_stroke_points: 0,
            ..CoreConfig::default()
        };
        assert_eq!(config.validate(), Err(CoreConfigError::ZeroStrokeCapacity));
    }
}
