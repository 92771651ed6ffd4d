//! Pixel-space rectangles used by the draw operations.

/// Edge-based rectangle in pixel coordinates (right/bottom exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle of the given size anchored at `(x, y)`.
    pub const fn from_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True when either extent is negative. Draw calls treat this as a no-op.
    /// Zero-sized rectangles are not inverted.
    pub const fn is_inverted(&self) -> bool {
        self.width() < 0 || self.height() < 0
    }
}

/// Axis-aligned edges of a quad, in whatever space the caller is working in
/// (NDC for positions, normalized texels for texture coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Edges {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_not_inverted() {
        let r = Rect::new(4, 4, 4, 4);
        assert_eq!(r.width(), 0);
        assert!(!r.is_inverted());
    }

    #[test]
    fn negative_extent_is_inverted() {
        assert!(Rect::new(10, 0, 5, 8).is_inverted());
        assert!(Rect::new(0, 10, 8, 5).is_inverted());
    }

    #[test]
    fn from_size_sets_edges() {
        let r = Rect::from_size(3, 5, 16, 8);
        assert_eq!(r, Rect::new(3, 5, 19, 13));
    }
}
