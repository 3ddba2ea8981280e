use model::{CanvasBounds, CanvasPoint, Rgb};
use serde::{Deserialize, Serialize};

/// Round stamp swept along a stroke. `radius` is in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub radius: i64,
    pub color: Rgb,
    pub alpha: f32,
}

impl Brush {
    /// Opaque background-colored brush. Erasing paints over, it never removes.
    pub fn eraser(radius: i64) -> Self {
        Self {
            radius,
            color: Rgb::WHITE,
            alpha: 1.0,
        }
    }

    pub fn with_radius(self, radius: i64) -> Self {
        Self { radius, ..self }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            radius: 0,
            color: Rgb::BLACK,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<CanvasPoint>,
    brush: Brush,
    #[serde(skip)]
    bounds: Option<CanvasBounds>,
}

impl Stroke {
    pub fn new(brush: Brush) -> Self {
        Self {
            points: Vec::new(),
            brush,
            bounds: None,
        }
    }

    pub fn from_points(brush: Brush, points: impl IntoIterator<Item = CanvasPoint>) -> Self {
        let mut stroke = Self::new(brush);
        for point in points {
            stroke.push(point);
        }
        stroke
    }

    pub fn points(&self) -> &[CanvasPoint] {
        &self.points
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box of the centerline, not inflated by the brush radius.
    pub fn bounds(&self) -> Option<CanvasBounds> {
        if self.bounds.is_some() {
            return self.bounds;
        }
        let (first, rest) = self.points.split_first()?;
        let mut bounds = CanvasBounds::from_point(*first);
        for point in rest {
            bounds.include(*point);
        }
        Some(bounds)
    }

    /// Consecutive point pairs. A single-point stroke yields one degenerate segment.
    pub fn segments(&self) -> impl Iterator<Item = (CanvasPoint, CanvasPoint)> + '_ {
        let single = (self.points.len() == 1).then(|| (self.points[0], self.points[0]));
        single
            .into_iter()
            .chain(self.points.windows(2).map(|pair| (pair[0], pair[1])))
    }

    pub(crate) fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub(crate) fn push(&mut self, point: CanvasPoint) {
        match self.bounds.as_mut() {
            Some(bounds) => bounds.include(point),
            None => self.bounds = Some(CanvasBounds::from_point(point)),
        }
        self.points.push(point);
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
        self.bounds = None;
    }
}
