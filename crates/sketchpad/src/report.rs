use std::fmt;

use engine::RenderCycleReport;
use frame_scheduler::RedrawReason;
use protocol::RenderFlags;
use smallvec::SmallVec;
use view::ViewError;

/// Recoverable issue met during one update cycle. Never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateWarning {
    /// The working stroke is full; the point was not stored.
    PointDropped { max_stroke_points: usize },
    /// The canvas is full; the finished stroke was discarded.
    StrokeDropped { max_strokes: usize },
    /// Undo arrived while a stroke was being drawn and was ignored.
    UndoWhileDrawing,
    /// The pan delta would overflow the view; the pan was ignored.
    PanRejected(ViewError),
    TilesFailed { count: usize },
}

impl fmt::Display for UpdateWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateWarning::PointDropped { max_stroke_points } => write!(
                formatter,
                "stroke point limit {max_stroke_points} reached; point dropped"
            ),
            UpdateWarning::StrokeDropped { max_strokes } => write!(
                formatter,
                "stroke limit {max_strokes} reached; stroke dropped"
            ),
            UpdateWarning::UndoWhileDrawing => {
                write!(formatter, "undo ignored while a stroke is in progress")
            }
            UpdateWarning::PanRejected(error) => write!(formatter, "pan ignored: {error}"),
            UpdateWarning::TilesFailed { count } => {
                write!(formatter, "{count} tiles failed to rasterize")
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub frame_sequence_id: u64,
    pub render_flags: RenderFlags,
    pub full_redraw_reason: Option<RedrawReason>,
    /// Index of the stroke committed this cycle.
    pub committed_stroke: Option<usize>,
    pub rendered: RenderCycleReport,
    pub warnings: SmallVec<[UpdateWarning; 2]>,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn has_warning(&self, warning: UpdateWarning) -> bool {
        self.warnings.contains(&warning)
    }
}
