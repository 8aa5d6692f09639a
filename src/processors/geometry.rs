//! Geometric primitives for canvas packing.
//!
//! This module provides the axis-aligned rectangle used throughout the
//! generation pipeline: element footprints, the canvas extent, and the
//! ground-truth bounding boxes all share this representation.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle with integer pixel coordinates.
///
/// A rectangle is constructed with a fixed width and height; its position can
/// be changed with [`Rect::set_position`], which recomputes the derived
/// `xmax`/`ymax` corners. Width and height never change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    xmin: u32,
    ymin: u32,
    xmax: u32,
    ymax: u32,
    width: u32,
    height: u32,
}

impl Rect {
    /// Creates a new rectangle at the given position.
    ///
    /// # Arguments
    ///
    /// * `xmin` - The x-coordinate of the top-left corner.
    /// * `ymin` - The y-coordinate of the top-left corner.
    /// * `width` - The width of the rectangle in pixels.
    /// * `height` - The height of the rectangle in pixels.
    #[inline]
    pub fn new(xmin: u32, ymin: u32, width: u32, height: u32) -> Self {
        Self {
            xmin,
            ymin,
            xmax: xmin + width,
            ymax: ymin + height,
            width,
            height,
        }
    }

    /// Creates a rectangle of the given size positioned at the origin.
    #[inline]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// The x-coordinate of the left edge.
    #[inline]
    pub fn xmin(&self) -> u32 {
        self.xmin
    }

    /// The y-coordinate of the top edge.
    #[inline]
    pub fn ymin(&self) -> u32 {
        self.ymin
    }

    /// The x-coordinate of the right edge (`xmin + width`).
    #[inline]
    pub fn xmax(&self) -> u32 {
        self.xmax
    }

    /// The y-coordinate of the bottom edge (`ymin + height`).
    #[inline]
    pub fn ymax(&self) -> u32 {
        self.ymax
    }

    /// The width of the rectangle.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height of the rectangle.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel area of the rectangle.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Moves the rectangle to a new position, keeping its size.
    ///
    /// The derived `xmax`/`ymax` corners are recomputed from the new
    /// position.
    pub fn set_position(&mut self, xmin: u32, ymin: u32) {
        self.xmin = xmin;
        self.ymin = ymin;
        self.xmax = xmin + self.width;
        self.ymax = ymin + self.height;
    }

    /// Checks whether this rectangle intersects another.
    ///
    /// Two rectangles are separated only when one lies strictly beyond the
    /// other along some axis. Rectangles whose edges merely touch count as
    /// intersecting, which trades a little packing density for guaranteed
    /// spacing between placed elements.
    ///
    /// # Arguments
    ///
    /// * `other` - The rectangle to test against.
    ///
    /// # Returns
    ///
    /// `true` if the rectangles overlap or touch, `false` otherwise.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.xmin > other.xmax || self.xmax < other.xmin {
            return false;
        }
        if self.ymin > other.ymax || self.ymax < other.ymin {
            return false;
        }
        true
    }

    /// Checks whether this rectangle intersects any rectangle in a list.
    ///
    /// # Arguments
    ///
    /// * `others` - The rectangles to test against.
    ///
    /// # Returns
    ///
    /// `true` if any member of `others` intersects this rectangle.
    pub fn intersects_any(&self, others: &[Rect]) -> bool {
        others.iter().any(|other| self.intersects(other))
    }

    /// Checks whether this rectangle fully contains another.
    ///
    /// Containment is closed on all four sides: a rectangle bounds itself,
    /// and an inner rectangle flush with an edge still counts as contained.
    ///
    /// # Arguments
    ///
    /// * `other` - The rectangle to test for containment.
    ///
    /// # Returns
    ///
    /// `true` if `other` lies entirely within this rectangle.
    pub fn bounds(&self, other: &Rect) -> bool {
        other.xmin >= self.xmin
            && other.ymin >= self.ymin
            && other.xmax <= self.xmax
            && other.ymax <= self.ymax
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect (xmin: {}, ymin: {}, width: {}, height: {})",
            self.xmin, self.ymin, self.width, self.height
        )
    }
}
