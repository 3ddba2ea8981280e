//! Per-cycle messages between the windowing layer and the core.

use bitflags::bitflags;
use model::Vec2i;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Discrete requests carried by one input batch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct InputFlags: u32 {
        const FULL_REFRESH    = 1 << 0;
        const RESET           = 1 << 1;
        const END_STROKE      = 1 << 2;
        const UNDO            = 1 << 3;
        const REDO            = 1 << 4;
        const SET_MODE_ERASER = 1 << 5;
        const SET_MODE_BRUSH  = 1 << 6;
        const FAST_DRAW       = 1 << 7;
    }
}

bitflags! {
    /// Render work requested for one cycle, shared read-only with every worker.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u32 {
        const FULL_REDRAW    = 1 << 0;
        const PICKER_UPDATED = 1 << 1;
    }
}

/// One batch of input delivered to an update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    #[serde(default)]
    pub flags: InputFlags,
    /// Pointer position in screen pixels, absent when the pointer was idle.
    #[serde(default)]
    pub point: Option<Vec2i>,
    /// Signed zoom delta. Positive zooms in.
    #[serde(default)]
    pub scale: i32,
    #[serde(default)]
    pub pan_delta: Vec2i,
}

impl InputFrame {
    pub fn flags(flags: InputFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    pub fn point(point: Vec2i) -> Self {
        Self {
            point: Some(point),
            ..Self::default()
        }
    }

    pub fn zoom(scale: i32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    pub fn pan(pan_delta: Vec2i) -> Self {
        Self {
            pan_delta,
            ..Self::default()
        }
    }

    pub fn with_flags(mut self, flags: InputFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_idle(&self) -> bool {
        self.flags.is_empty()
            && self.point.is_none()
            && self.scale == 0
            && self.pan_delta == Vec2i::ZERO
    }
}
