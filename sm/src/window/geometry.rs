//! Window geometry primitives

use serde::{Deserialize, Serialize};

/// Width and height of a window's client area, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Shrink this size so it fits within `bounds`
    ///
    /// Dimensions already inside the bounds are left untouched; the window is
    /// never grown to fill the screen.
    pub fn clamp_to(&self, bounds: Size) -> Size {
        Size {
            width: self.width.min(bounds.width),
            height: self.height.min(bounds.height),
        }
    }
}

/// Screen position of a window's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Size and position of a live window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub size: Size,
    pub position: Point,
}

impl Geometry {
    pub fn new(size: Size, position: Point) -> Self {
        Self { size, position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_shrinks_oversized_window() {
        let preferred = Size::new(2400, 1600);
        let adjusted = preferred.clamp_to(Size::new(1920, 1080));
        assert_eq!(adjusted, Size::new(1920, 1080));
    }

    #[test]
    fn test_clamp_keeps_fitting_window() {
        let preferred = Size::new(800, 600);
        assert_eq!(preferred.clamp_to(Size::new(1920, 1080)), preferred);
    }

    #[test]
    fn test_clamp_single_dimension() {
        let preferred = Size::new(800, 1400);
        assert_eq!(preferred.clamp_to(Size::new(1920, 1080)), Size::new(800, 1080));
    }
}
