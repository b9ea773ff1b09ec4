#![forbid(unsafe_code)]

//! Geometric primitives for overflow measurement.
//!
//! All values are CSS pixels in the host's viewport coordinate space
//! (origin at top-left, y grows downward). Rects are what a rendering
//! engine reports for an element's border box.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A rendered box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Move the rectangle by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Compute the intersection with another rectangle, returning `None` if
    /// the rectangles do not overlap.
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Fraction of this rectangle's area that lies inside `root`.
    ///
    /// Mirrors the intersection ratio a viewport-intersection observer
    /// reports. An empty target that sits inside the root reports `1.0`.
    pub fn visible_ratio_in(&self, root: &Rect) -> f64 {
        if self.is_empty() {
            let inside = self.x >= root.x
                && self.y >= root.y
                && self.right() <= root.right()
                && self.bottom() <= root.bottom();
            return if inside { 1.0 } else { 0.0 };
        }
        match self.intersection_opt(root) {
            Some(clip) => (clip.area() / self.area()).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

bitflags! {
    /// A set of box sides.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Side: u8 {
        const TOP = 0b0001;
        const RIGHT = 0b0010;
        const BOTTOM = 0b0100;
        const LEFT = 0b1000;

        const HORIZONTAL = Self::LEFT.bits() | Self::RIGHT.bits();
        const VERTICAL = Self::TOP.bits() | Self::BOTTOM.bits();
    }
}

/// Four-sided overflow of an element relative to its container, in pixels.
///
/// # Invariants
///
/// Every side is `>= 0`. A side is zero when the element's edge lies on or
/// inside the container's corresponding edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Overflow {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Overflow {
    /// No overflow on any side.
    pub const NONE: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    /// Measure how far `element` extends past `container` on each side.
    ///
    /// Pure function of the two rects: identical inputs always give
    /// identical outputs.
    pub fn measure(element: &Rect, container: &Rect) -> Self {
        Self {
            top: non_negative(container.top() - element.top()),
            right: non_negative(element.right() - container.right()),
            bottom: non_negative(element.bottom() - container.bottom()),
            left: non_negative(container.left() - element.left()),
        }
    }

    /// Amount on a single side. `side` must name exactly one side.
    pub fn get(&self, side: Side) -> f64 {
        if side == Side::TOP {
            self.top
        } else if side == Side::RIGHT {
            self.right
        } else if side == Side::BOTTOM {
            self.bottom
        } else if side == Side::LEFT {
            self.left
        } else {
            0.0
        }
    }

    /// Sides whose overflow strictly exceeds `threshold`.
    pub fn sides_exceeding(&self, threshold: f64) -> Side {
        let mut sides = Side::empty();
        if self.top > threshold {
            sides |= Side::TOP;
        }
        if self.right > threshold {
            sides |= Side::RIGHT;
        }
        if self.bottom > threshold {
            sides |= Side::BOTTOM;
        }
        if self.left > threshold {
            sides |= Side::LEFT;
        }
        sides
    }

    /// Whether any side strictly exceeds `threshold`.
    ///
    /// A side exactly equal to the threshold is not a violation.
    #[inline]
    pub fn exceeds(&self, threshold: f64) -> bool {
        !self.sides_exceeding(threshold).is_empty()
    }

    /// Sides with any positive overflow.
    #[inline]
    pub fn sides(&self) -> Side {
        self.sides_exceeding(0.0)
    }

    /// Largest vertical overflow.
    #[inline]
    pub fn vertical(&self) -> f64 {
        self.top.max(self.bottom)
    }

    /// Largest horizontal overflow.
    #[inline]
    pub fn horizontal(&self) -> f64 {
        self.left.max(self.right)
    }

    /// Largest overflow on any side.
    #[inline]
    pub fn max_side(&self) -> f64 {
        self.vertical().max(self.horizontal())
    }
}

#[inline]
fn non_negative(v: f64) -> f64 {
    // NaN from a degenerate host rect collapses to zero.
    if v > 0.0 { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::{Overflow, Rect, Side};

    #[test]
    fn rect_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.left(), 10.0);
        assert_eq!(r.top(), 20.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.area(), 1200.0);
    }

    #[test]
    fn rect_intersection_no_overlap_is_none() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 3.0, 2.0, 2.0);
        assert_eq!(a.intersection_opt(&b), None);
        assert_eq!(a.visible_ratio_in(&b), 0.0);
    }

    #[test]
    fn visible_ratio_half_outside() {
        let root = Rect::from_size(100.0, 100.0);
        let half = Rect::new(50.0, 0.0, 100.0, 100.0);
        assert!((half.visible_ratio_in(&root) - 0.5).abs() < 1e-9);
        assert_eq!(Rect::new(10.0, 10.0, 0.0, 0.0).visible_ratio_in(&root), 1.0);
    }

    #[test]
    fn measure_wide_child_at_origin() {
        let container = Rect::from_size(1920.0, 1080.0);
        let child = Rect::from_size(2000.0, 100.0);
        let overflow = Overflow::measure(&child, &container);
        assert_eq!(overflow.right, 80.0);
        assert_eq!(overflow.bottom, 0.0);
        assert_eq!(overflow.top, 0.0);
        assert_eq!(overflow.left, 0.0);
        assert_eq!(overflow.sides(), Side::RIGHT);
    }

    #[test]
    fn measure_offset_container() {
        let container = Rect::new(100.0, 100.0, 200.0, 200.0);
        let child = Rect::new(90.0, 95.0, 50.0, 50.0);
        let overflow = Overflow::measure(&child, &container);
        assert_eq!(overflow.left, 10.0);
        assert_eq!(overflow.top, 5.0);
        assert_eq!(overflow.sides(), Side::TOP | Side::LEFT);
    }

    #[test]
    fn threshold_is_strict() {
        let overflow = Overflow {
            right: 5.0,
            ..Overflow::NONE
        };
        assert!(!overflow.exceeds(5.0));
        assert!(overflow.exceeds(4.999));
        assert_eq!(overflow.sides_exceeding(5.0), Side::empty());
    }

    #[test]
    fn nan_collapses_to_zero() {
        let container = Rect::from_size(10.0, 10.0);
        let child = Rect::new(f64::NAN, 0.0, 5.0, 5.0);
        let overflow = Overflow::measure(&child, &container);
        assert_eq!(overflow.left, 0.0);
        assert_eq!(overflow.right, 0.0);
    }

    #[test]
    fn axis_helpers() {
        let overflow = Overflow {
            top: 3.0,
            right: 7.0,
            bottom: 11.0,
            left: 2.0,
        };
        assert_eq!(overflow.vertical(), 11.0);
        assert_eq!(overflow.horizontal(), 7.0);
        assert_eq!(overflow.max_side(), 11.0);
        assert_eq!(overflow.get(Side::LEFT), 2.0);
        assert_eq!(overflow.get(Side::HORIZONTAL), 0.0);
    }
}
