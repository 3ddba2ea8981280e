//! Integer geometry shared by every stage of the pipeline.
//!
//! Screen space uses `i32` pixels. Canvas space uses `i64` fixed-point units so
//! that `screen * scale + pan + focus * radius` never overflows in practice.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn width(self) -> i32 {
        self.x
    }

    pub fn height(self) -> i32 {
        self.y
    }

    pub fn halved(self) -> Self {
        Self {
            x: self.x / 2,
            y: self.y / 2,
        }
    }
}

impl Add for Vec2i {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2i {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A point (or offset) in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: i64,
    pub y: i64,
}

impl CanvasPoint {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl Add for CanvasPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for CanvasPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned canvas-space box, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasBounds {
    pub min: CanvasPoint,
    pub max: CanvasPoint,
}

impl CanvasBounds {
    pub fn from_point(point: CanvasPoint) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn include(&mut self, point: CanvasPoint) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn inflated(self, amount: i64) -> Self {
        Self {
            min: CanvasPoint::new(
                self.min.x.saturating_sub(amount),
                self.min.y.saturating_sub(amount),
            ),
            max: CanvasPoint::new(
                self.max.x.saturating_add(amount),
                self.max.y.saturating_add(amount),
            ),
        }
    }

    pub fn intersects(&self, other: &CanvasBounds) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Screen-space rectangle: `left`/`top` inclusive, `right`/`bottom` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_size(size: Vec2i) -> Self {
        Self::new(0, 0, size.x.max(0), size.y.max(0))
    }

    /// Smallest rect covering both pixels.
    pub fn spanning(a: Vec2i, b: Vec2i) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            a.x.max(b.x).saturating_add(1),
            a.y.max(b.y).saturating_add(1),
        )
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn contains(&self, point: Vec2i) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    pub fn inflated(&self, amount: i32) -> Self {
        Self::new(
            self.left.saturating_sub(amount),
            self.top.saturating_sub(amount),
            self.right.saturating_add(amount),
            self.bottom.saturating_add(amount),
        )
    }

    /// Union of two rects. Empty operands are ignored.
    pub fn union(&self, other: &ScreenRect) -> ScreenRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn intersection(&self, other: &ScreenRect) -> ScreenRect {
        let rect = Self::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if rect.is_empty() {
            ScreenRect::default()
        } else {
            rect
        }
    }

    pub fn intersects(&self, other: &ScreenRect) -> bool {
        !self.intersection(other).is_empty()
    }

    pub fn area(&self) -> usize {
        self.width().max(0) as usize * self.height().max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_ignores_empty_operands() {
        let rect = ScreenRect::new(4, 4, 10, 12);
        assert_eq!(ScreenRect::default().union(&rect), rect);
        assert_eq!(rect.union(&ScreenRect::default()), rect);
        assert_eq!(
            rect.union(&ScreenRect::new(0, 8, 5, 20)),
            ScreenRect::new(0, 4, 10, 20)
        );
    }

    #[test]
    fn spanning_rect_includes_both_pixels() {
        let rect = ScreenRect::spanning(Vec2i::new(9, 2), Vec2i::new(3, 7));
        assert!(rect.contains(Vec2i::new(9, 2)));
        assert!(rect.contains(Vec2i::new(3, 7)));
        assert_eq!(rect.width(), 7);
        assert_eq!(rect.height(), 6);
    }

    #[test]
    fn disjoint_rects_have_empty_intersection() {
        let a = ScreenRect::new(0, 0, 10, 10);
        let b = ScreenRect::new(10, 0, 20, 10);
        assert!(!a.intersects(&b));
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn canvas_bounds_intersection_is_inclusive() {
        let mut bounds = CanvasBounds::from_point(CanvasPoint::new(0, 0));
        bounds.include(CanvasPoint::new(100, 0));
        let touching = CanvasBounds::from_point(CanvasPoint::new(100, 0));
        assert!(bounds.intersects(&touching));
        let away = CanvasBounds::from_point(CanvasPoint::new(101, 1));
        assert!(!bounds.intersects(&away));
        assert!(bounds.inflated(1).intersects(&away));
    }
}
