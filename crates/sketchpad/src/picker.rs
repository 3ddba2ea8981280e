use model::{Hsv, Vec2i};

use crate::config::DEFAULT_PICKER_HSV;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PickResult {
    pub color_changed: bool,
}

/// Color picker widget as seen by the update cycle.
///
/// Points are screen pixels. The widget owns its own geometry and drawing;
/// the core only routes input to it and reads back the chosen color.
pub trait ColorPicker {
    /// Hit region that takes a press away from the canvas.
    fn contains(&self, point: Vec2i) -> bool;
    fn pick(&mut self, point: Vec2i) -> PickResult;
    /// Whether the hue wheel is being dragged.
    fn wheel_active(&self) -> bool;
    fn update_wheel(&mut self, point: Vec2i);
    fn deactivate_wheel(&mut self);
    fn is_inside_triangle(&self, point: Vec2i) -> bool;
    fn hsv(&self) -> Hsv;
}

/// Picker for headless use. Never hit, holds a fixed color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoPicker {
    hsv: Hsv,
}

impl NoPicker {
    pub fn new(hsv: Hsv) -> Self {
        Self { hsv }
    }
}

impl Default for NoPicker {
    fn default() -> Self {
        Self::new(DEFAULT_PICKER_HSV)
    }
}

impl ColorPicker for NoPicker {
    fn contains(&self, _point: Vec2i) -> bool {
        false
    }

    fn pick(&mut self, _point: Vec2i) -> PickResult {
        PickResult::default()
    }

    fn wheel_active(&self) -> bool {
        false
    }

    fn update_wheel(&mut self, _point: Vec2i) {}

    fn deactivate_wheel(&mut self) {}

    fn is_inside_triangle(&self, _point: Vec2i) -> bool {
        false
    }

    fn hsv(&self) -> Hsv {
        self.hsv
    }
}
