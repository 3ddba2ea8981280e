//! Fixed-point transform between raster pixels and canvas space.
//!
//! `canvas = (screen - screen_center) * scale + pan_vector + tile_focus * tile_radius`
//!
//! All math is integer. `pan_vector` stays inside `(-tile_radius, tile_radius]`
//! on each axis; whole radius-widths are moved into `tile_focus` on every resize.

use std::fmt;

use model::{CanvasPoint, Vec2i};

pub const DEFAULT_SCALE: i64 = 1 << 10;
pub const DEFAULT_CANVAS_TILE_RADIUS: i64 = 1024 * 1024 * 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomConfig {
    pub factor_numerator: i64,
    pub factor_denominator: i64,
    pub max_scale: i64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            factor_numerator: 13,
            factor_denominator: 10,
            max_scale: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    pub max_screen_size: Vec2i,
    pub initial_scale: i64,
    pub canvas_tile_radius: i64,
    pub zoom: ZoomConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_screen_size: Vec2i::new(7680, 4320),
            initial_scale: DEFAULT_SCALE,
            canvas_tile_radius: DEFAULT_CANVAS_TILE_RADIUS,
            zoom: ZoomConfig::default(),
        }
    }
}

/// Coarse tile-grid coordinate absorbing pan overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileFocus {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewError {
    OutOfBounds { requested: Vec2i, max: Vec2i },
    InvalidScale,
    InvalidTileRadius,
    InvalidZoomFactor,
    Overflow,
}

impl fmt::Display for ViewError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::OutOfBounds { requested, max } => write!(
                formatter,
                "screen size {}x{} exceeds raster capacity {}x{}",
                requested.x, requested.y, max.x, max.y
            ),
            ViewError::InvalidScale => write!(formatter, "view scale must be at least 1"),
            ViewError::InvalidTileRadius => {
                write!(formatter, "canvas tile radius must be positive")
            }
            ViewError::InvalidZoomFactor => {
                write!(formatter, "zoom factor must be greater than one")
            }
            ViewError::Overflow => write!(formatter, "pan arithmetic overflowed"),
        }
    }
}

impl std::error::Error for ViewError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasView {
    screen_size: Vec2i,
    screen_center: Vec2i,
    max_screen_size: Vec2i,
    scale: i64,
    pan_vector: CanvasPoint,
    canvas_tile_focus: TileFocus,
    canvas_tile_radius: i64,
    downsampling_factor: i32,
    zoom: ZoomConfig,
    // Set once zoom-in bottoms out at scale 1, cleared by the next zoom-out.
    zoom_locked: bool,
}

impl CanvasView {
    pub fn new(config: ViewConfig) -> Result<Self, ViewError> {
        if config.initial_scale < 1 {
            return Err(ViewError::InvalidScale);
        }
        if config.canvas_tile_radius < 1 {
            return Err(ViewError::InvalidTileRadius);
        }
        if config.zoom.factor_denominator < 1
            || config.zoom.factor_numerator <= config.zoom.factor_denominator
        {
            return Err(ViewError::InvalidZoomFactor);
        }
        if config.zoom.max_scale < 1 {
            return Err(ViewError::InvalidScale);
        }
        if config.max_screen_size.x < 0 || config.max_screen_size.y < 0 {
            return Err(ViewError::OutOfBounds {
                requested: config.max_screen_size,
                max: config.max_screen_size,
            });
        }
        Ok(Self {
            screen_size: Vec2i::ZERO,
            screen_center: Vec2i::ZERO,
            max_screen_size: config.max_screen_size,
            scale: config.initial_scale,
            pan_vector: CanvasPoint::ORIGIN,
            canvas_tile_focus: TileFocus::default(),
            canvas_tile_radius: config.canvas_tile_radius,
            downsampling_factor: 1,
            zoom: config.zoom,
            zoom_locked: false,
        })
    }

    pub fn screen_size(&self) -> Vec2i {
        self.screen_size
    }

    pub fn screen_center(&self) -> Vec2i {
        self.screen_center
    }

    pub fn max_screen_size(&self) -> Vec2i {
        self.max_screen_size
    }

    pub fn scale(&self) -> i64 {
        self.scale
    }

    pub fn pan_vector(&self) -> CanvasPoint {
        self.pan_vector
    }

    pub fn canvas_tile_focus(&self) -> TileFocus {
        self.canvas_tile_focus
    }

    pub fn canvas_tile_radius(&self) -> i64 {
        self.canvas_tile_radius
    }

    pub fn downsampling_factor(&self) -> i32 {
        self.downsampling_factor
    }

    pub fn zoom_locked(&self) -> bool {
        self.zoom_locked
    }

    pub fn set_downsampling_factor(&mut self, factor: i32) {
        self.downsampling_factor = factor.max(1);
    }

    /// Canvas offset contributed by the tile focus.
    pub fn focus_offset(&self) -> CanvasPoint {
        CanvasPoint::new(
            self.canvas_tile_focus.x * self.canvas_tile_radius,
            self.canvas_tile_focus.y * self.canvas_tile_radius,
        )
    }

    /// Length of `pixels` screen pixels in canvas units at the current scale.
    pub fn pixels_to_canvas(&self, pixels: i64) -> i64 {
        pixels * self.scale
    }

    pub fn raster_to_canvas(&self, point: Vec2i) -> CanvasPoint {
        let focus = self.focus_offset();
        CanvasPoint::new(
            (point.x as i64 - self.screen_center.x as i64) * self.scale
                + self.pan_vector.x
                + focus.x,
            (point.y as i64 - self.screen_center.y as i64) * self.scale
                + self.pan_vector.y
                + focus.y,
        )
    }

    /// Inverse of [`CanvasView::raster_to_canvas`], flooring to the containing pixel.
    pub fn canvas_to_raster(&self, point: CanvasPoint) -> Vec2i {
        let relative = point - self.focus_offset() - self.pan_vector;
        let to_screen = |value: i64, center: i32| {
            let pixel = value.div_euclid(self.scale) + center as i64;
            pixel.clamp(i32::MIN as i64, i32::MAX as i64) as i32
        };
        Vec2i::new(
            to_screen(relative.x, self.screen_center.x),
            to_screen(relative.y, self.screen_center.y),
        )
    }

    pub fn resize(&mut self, pan_delta: Vec2i, new_screen_size: Vec2i) -> Result<(), ViewError> {
        if new_screen_size.x < 0
            || new_screen_size.y < 0
            || new_screen_size.x > self.max_screen_size.x
            || new_screen_size.y > self.max_screen_size.y
        {
            return Err(ViewError::OutOfBounds {
                requested: new_screen_size,
                max: self.max_screen_size,
            });
        }

        let pan_x = checked_add(
            self.pan_vector.x,
            checked_mul(pan_delta.x as i64, self.scale)?,
        )?;
        let pan_y = checked_add(
            self.pan_vector.y,
            checked_mul(pan_delta.y as i64, self.scale)?,
        )?;
        let (focus_dx, pan_x) = wrap_axis(pan_x, self.canvas_tile_radius);
        let (focus_dy, pan_y) = wrap_axis(pan_y, self.canvas_tile_radius);
        let focus = TileFocus {
            x: checked_add(self.canvas_tile_focus.x, focus_dx)?,
            y: checked_add(self.canvas_tile_focus.y, focus_dy)?,
        };

        self.screen_size = new_screen_size;
        self.screen_center = new_screen_size.halved();
        self.pan_vector = CanvasPoint::new(pan_x, pan_y);
        self.canvas_tile_focus = focus;
        Ok(())
    }

    /// One zoom step. Positive deltas zoom in (fewer canvas units per pixel).
    /// Returns whether the scale changed.
    pub fn apply_zoom(&mut self, scale_delta: i32) -> bool {
        let previous = self.scale;
        if scale_delta > 0 && !self.zoom_locked && self.scale >= 2 {
            self.scale = (self.scale * self.zoom.factor_denominator / self.zoom.factor_numerator)
                .max(1);
            if self.scale == 1 {
                self.zoom_locked = true;
            }
        } else if scale_delta < 0 && self.scale < self.zoom.max_scale {
            self.zoom_locked = false;
            self.scale = self.scale * self.zoom.factor_numerator / self.zoom.factor_denominator + 1;
        }
        self.scale != previous
    }
}

/// Moves whole radius-widths out of `value` until it lies in `(-radius, radius]`.
/// Returns the number of widths moved (signed) and the wrapped value.
fn wrap_axis(value: i64, radius: i64) -> (i64, i64) {
    if value > radius {
        let widths = (value - 1) / radius;
        (widths, value - widths * radius)
    } else if value <= -radius {
        let widths = (-radius - value) / radius + 1;
        (-widths, value + widths * radius)
    } else {
        (0, value)
    }
}

fn checked_add(current: i64, delta: i64) -> Result<i64, ViewError> {
    current.checked_add(delta).ok_or(ViewError::Overflow)
}

fn checked_mul(left: i64, right: i64) -> Result<i64, ViewError> {
    left.checked_mul(right).ok_or(ViewError::Overflow)
}
