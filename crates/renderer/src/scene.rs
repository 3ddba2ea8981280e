use std::sync::Arc;

use document::{Stroke, StrokeStore};
use model::Rgb;
use protocol::RenderFlags;
use view::CanvasView;

/// Everything a worker needs to rasterize any tile of one cycle.
///
/// Captured by the owner after the cycle's mutations and never changed while
/// workers hold it. Committed strokes are shared, not copied.
#[derive(Debug, Clone)]
pub struct RenderScene {
    pub view: CanvasView,
    pub render_flags: RenderFlags,
    pub background: Rgb,
    strokes: Vec<Arc<Stroke>>,
    working_stroke: Option<Arc<Stroke>>,
}

impl RenderScene {
    pub fn new(view: CanvasView, render_flags: RenderFlags) -> Self {
        Self {
            view,
            render_flags,
            background: Rgb::WHITE,
            strokes: Vec::new(),
            working_stroke: None,
        }
    }

    pub fn capture(view: CanvasView, store: &StrokeStore, render_flags: RenderFlags) -> Self {
        let working_stroke = store.working_stroke();
        Self {
            strokes: store.visible_strokes().to_vec(),
            working_stroke: (!working_stroke.is_empty()).then(|| Arc::new(working_stroke.clone())),
            ..Self::new(view, render_flags)
        }
    }

    pub fn push_stroke(&mut self, stroke: Stroke) {
        self.strokes.push(Arc::new(stroke));
    }

    /// Committed strokes plus the working stroke, if any.
    pub fn stroke_count(&self) -> usize {
        self.strokes.len() + self.working_stroke.is_some() as usize
    }

    /// Stroke at `index` in draw order; the working stroke is drawn last.
    pub fn stroke(&self, index: usize) -> &Stroke {
        match self.strokes.get(index) {
            Some(stroke) => stroke,
            None => self
                .working_stroke
                .as_deref()
                .filter(|_| index == self.strokes.len())
                .unwrap_or_else(|| panic!("stroke index {index} out of scene")),
        }
    }

    pub fn strokes_in_draw_order(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes
            .iter()
            .map(Arc::as_ref)
            .chain(self.working_stroke.as_deref())
    }
}
