//! Rectangle, size and point primitives plus the coordinate-space transforms
//! used to move boxes between sensor, image, crop-local and display space.
//!
//! All transforms are pure and total. Results may be negative or lie outside
//! the reference frame; callers decide whether that means "no detection".

use serde::{Deserialize, Serialize};

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a frame or crop
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size with width and height swapped (the frame after a quarter turn)
    #[must_use]
    pub const fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// True when either dimension is not strictly positive
    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle with its origin at the minimum corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle anchored at the origin covering `size`
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// A rectangle with non-positive or non-finite size counts as no detection
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
            || !(self.x.is_finite() && self.y.is_finite())
    }

    /// Same size, new origin
    #[must_use]
    pub const fn with_origin(self, origin: Point) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }

    /// Mirror across the vertical axis of `frame`
    #[must_use]
    pub fn flip_x(&self, frame: Size) -> Self {
        Self::new(frame.width - (self.x + self.width), self.y, self.width, self.height)
    }

    /// Mirror across the horizontal axis of `frame` (top-left <-> bottom-left origin)
    #[must_use]
    pub fn flip_y(&self, frame: Size) -> Self {
        Self::new(self.x, frame.height - (self.y + self.height), self.width, self.height)
    }

    /// Multiply origin and size by `factor`
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Where this rect lands if its source frame is turned 90° clockwise
    #[must_use]
    pub fn rotate_right(&self, source: Size) -> Self {
        Self::new(
            source.height - (self.y + self.height),
            self.x,
            self.height,
            self.width,
        )
    }

    /// Where this rect lands if its source frame is turned 90° counter-clockwise
    #[must_use]
    pub fn rotate_left(&self, source: Size) -> Self {
        Self::new(
            self.y,
            source.width - (self.x + self.width),
            self.height,
            self.width,
        )
    }

    /// Where this rect lands if its source frame is turned 180°
    #[must_use]
    pub fn rotate_180(&self, source: Size) -> Self {
        Self::new(
            source.width - (self.x + self.width),
            source.height - (self.y + self.height),
            self.width,
            self.height,
        )
    }

    /// Translate by (dx, dy)
    #[must_use]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow every edge outward by `margin` (negative shrinks)
    #[must_use]
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Component-wise comparison within `tolerance`
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}
