mod stroke;

use std::fmt;
use std::sync::Arc;

use model::CanvasPoint;

pub use stroke::{Brush, Stroke};

pub const DEFAULT_MAX_STROKES: usize = 4096;
pub const DEFAULT_MAX_STROKE_POINTS: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeStoreConfig {
    pub max_strokes: usize,
    pub max_stroke_points: usize,
}

impl Default for StrokeStoreConfig {
    fn default() -> Self {
        Self {
            max_strokes: DEFAULT_MAX_STROKES,
            max_stroke_points: DEFAULT_MAX_STROKE_POINTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStoreError {
    /// The working stroke is full; the point was dropped.
    PointCapacityExceeded { max_stroke_points: usize },
    /// The store is full; the working stroke was dropped.
    StrokeCapacityExceeded { max_strokes: usize },
    /// Undo requested while a stroke is being drawn.
    InvalidOperation,
}

impl fmt::Display for StrokeStoreError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrokeStoreError::PointCapacityExceeded { max_stroke_points } => write!(
                formatter,
                "stroke already holds {max_stroke_points} points; point dropped"
            ),
            StrokeStoreError::StrokeCapacityExceeded { max_strokes } => write!(
                formatter,
                "canvas already holds {max_strokes} strokes; stroke dropped"
            ),
            StrokeStoreError::InvalidOperation => {
                write!(formatter, "cannot undo while a stroke is in progress")
            }
        }
    }
}

impl std::error::Error for StrokeStoreError {}

/// Committed strokes in draw order plus the one stroke being drawn.
///
/// `strokes[..num_strokes]` are visible. `strokes[num_strokes..]` are the redo
/// history: hidden, not cleared, and dropped by the next edit.
#[derive(Debug, Clone)]
pub struct StrokeStore {
    config: StrokeStoreConfig,
    strokes: Vec<Arc<Stroke>>,
    num_strokes: usize,
    working_stroke: Stroke,
}

impl StrokeStore {
    pub fn new(config: StrokeStoreConfig) -> Self {
        Self {
            config,
            strokes: Vec::new(),
            num_strokes: 0,
            working_stroke: Stroke::default(),
        }
    }

    pub fn config(&self) -> StrokeStoreConfig {
        self.config
    }

    pub fn num_strokes(&self) -> usize {
        self.num_strokes
    }

    pub fn num_redos(&self) -> usize {
        self.strokes.len() - self.num_strokes
    }

    pub fn total_strokes(&self) -> usize {
        self.strokes.len()
    }

    pub fn visible_strokes(&self) -> &[Arc<Stroke>] {
        &self.strokes[..self.num_strokes]
    }

    pub fn working_stroke(&self) -> &Stroke {
        &self.working_stroke
    }

    pub fn is_drawing(&self) -> bool {
        !self.working_stroke.is_empty()
    }

    /// Appends a point to the working stroke. The first point snapshots `brush`.
    pub fn push_point(&mut self, point: CanvasPoint, brush: &Brush) -> Result<(), StrokeStoreError> {
        if self.working_stroke.is_empty() {
            self.working_stroke.set_brush(*brush);
        }
        if self.working_stroke.len() >= self.config.max_stroke_points {
            return Err(StrokeStoreError::PointCapacityExceeded {
                max_stroke_points: self.config.max_stroke_points,
            });
        }
        self.working_stroke.push(point);
        Ok(())
    }

    /// Moves the working stroke into the committed sequence.
    ///
    /// Returns the index of the new stroke, or `None` when there was nothing to
    /// commit. The working stroke is empty afterwards in every case.
    pub fn commit_working_stroke(&mut self) -> Result<Option<usize>, StrokeStoreError> {
        if self.working_stroke.is_empty() {
            return Ok(None);
        }
        let stroke = std::mem::take(&mut self.working_stroke);
        if self.num_strokes >= self.config.max_strokes {
            return Err(StrokeStoreError::StrokeCapacityExceeded {
                max_strokes: self.config.max_strokes,
            });
        }
        self.discard_redo();
        self.strokes.push(Arc::new(stroke));
        self.num_strokes += 1;
        Ok(Some(self.num_strokes - 1))
    }

    /// Hides the newest visible stroke. Returns whether anything changed.
    pub fn undo(&mut self) -> Result<bool, StrokeStoreError> {
        if self.is_drawing() {
            return Err(StrokeStoreError::InvalidOperation);
        }
        if self.num_strokes == 0 {
            return Ok(false);
        }
        self.num_strokes -= 1;
        Ok(true)
    }

    /// Shows the most recently undone stroke. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        if self.num_redos() == 0 {
            return false;
        }
        self.num_strokes += 1;
        true
    }

    pub fn discard_redo(&mut self) {
        self.strokes.truncate(self.num_strokes);
    }

    /// Clears committed strokes, redo history and the working stroke.
    pub fn reset(&mut self) {
        self.strokes.clear();
        self.num_strokes = 0;
        self.working_stroke.clear();
    }

    pub fn clear_working_stroke(&mut self) {
        self.working_stroke.clear();
    }
}

impl Default for StrokeStore {
    fn default() -> Self {
        Self::new(StrokeStoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Rgb;

    fn brush() -> Brush {
        Brush {
            radius: 10 * 1024,
            color: Rgb::new(0.2, 0.4, 0.6),
            alpha: 0.5,
        }
    }

    fn commit_line(store: &mut StrokeStore, x: i64) {
        store
            .push_point(CanvasPoint::new(x, 0), &brush())
            .expect("first point");
        store
            .push_point(CanvasPoint::new(x, 100), &brush())
            .expect("second point");
        store.commit_working_stroke().expect("commit");
    }

    #[test]
    fn first_point_snapshots_brush() {
        let mut store = StrokeStore::default();
        store
            .push_point(CanvasPoint::new(0, 0), &brush())
            .expect("point");
        store
            .push_point(CanvasPoint::new(1, 1), &Brush::eraser(1))
            .expect("point");
        assert_eq!(*store.working_stroke().brush(), brush());
        assert!(store.is_drawing());
    }

    #[test]
    fn commit_moves_working_stroke_and_clears_it() {
        let mut store = StrokeStore::default();
        commit_line(&mut store, 0);
        assert_eq!(store.num_strokes(), 1);
        assert!(!store.is_drawing());
        assert_eq!(store.visible_strokes()[0].len(), 2);
    }

    #[test]
    fn empty_working_stroke_is_never_committed() {
        let mut store = StrokeStore::default();
        assert_eq!(store.commit_working_stroke(), Ok(None));
        assert_eq!(store.num_strokes(), 0);
    }

    #[test]
    fn points_past_capacity_are_rejected() {
        let mut store = StrokeStore::new(StrokeStoreConfig {
            max_strokes: 4,
            max_stroke_points: 2,
        });
        store
            .push_point(CanvasPoint::new(0, 0), &brush())
            .expect("point");
        store
            .push_point(CanvasPoint::new(0, 1), &brush())
            .expect("point");
        assert_eq!(
            store.push_point(CanvasPoint::new(0, 2), &brush()),
            Err(StrokeStoreError::PointCapacityExceeded {
                max_stroke_points: 2
            })
        );
        assert_eq!(store.working_stroke().len(), 2);
    }

    #[test]
    fn full_store_drops_the_working_stroke() {
        let mut store = StrokeStore::new(StrokeStoreConfig {
            max_strokes: 1,
            max_stroke_points: 8,
        });
        commit_line(&mut store, 0);
        store
            .push_point(CanvasPoint::new(5, 5), &brush())
            .expect("point");
        assert_eq!(
            store.commit_working_stroke(),
            Err(StrokeStoreError::StrokeCapacityExceeded { max_strokes: 1 })
        );
        assert_eq!(store.num_strokes(), 1);
        assert!(!store.is_drawing());
    }

    #[test]
    fn undo_and_redo_move_the_visible_boundary() {
        let mut store = StrokeStore::default();
        commit_line(&mut store, 0);
        commit_line(&mut store, 10);
        assert_eq!(store.undo(), Ok(true));
        assert_eq!((store.num_strokes(), store.num_redos()), (1, 1));
        assert_eq!(store.visible_strokes().len(), 1);
        assert!(store.redo());
        assert_eq!((store.num_strokes(), store.num_redos()), (2, 0));
        assert!(!store.redo());
    }

    #[test]
    fn undo_while_drawing_is_rejected() {
        let mut store = StrokeStore::default();
        commit_line(&mut store, 0);
        store
            .push_point(CanvasPoint::new(1, 1), &brush())
            .expect("point");
        assert_eq!(store.undo(), Err(StrokeStoreError::InvalidOperation));
        assert_eq!(store.num_strokes(), 1);
    }

    #[test]
    fn commit_after_undo_discards_redo_history() {
        let mut store = StrokeStore::default();
        commit_line(&mut store, 0);
        commit_line(&mut store, 10);
        store.undo().expect("undo");
        commit_line(&mut store, 20);
        assert_eq!(store.num_redos(), 0);
        assert_eq!(store.total_strokes(), 2);
        assert_eq!(store.visible_strokes()[1].points()[0], CanvasPoint::new(20, 0));
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = StrokeStore::default();
        commit_line(&mut store, 0);
        commit_line(&mut store, 10);
        store.undo().expect("undo");
        store
            .push_point(CanvasPoint::new(0, 0), &brush())
            .expect("point");
        store.reset();
        assert_eq!(store.num_strokes(), 0);
        assert_eq!(store.num_redos(), 0);
        assert!(!store.is_drawing());
        assert!(!store.redo());
    }
}
