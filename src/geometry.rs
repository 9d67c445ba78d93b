//! Shared geometry types.

use std::ops::{Add, Mul, Sub};

/// 2D object position.
#[derive(PartialEq, Copy, Clone, Default, Debug)]
pub struct Position<T = f32> {
    pub x: T,
    pub y: T,
}

impl<T> Position<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> From<(T, T)> for Position<T> {
    fn from((x, y): (T, T)) -> Self {
        Self { x, y }
    }
}

impl<T: Add<T, Output = T>> Add<Position<T>> for Position<T> {
    type Output = Self;

    fn add(mut self, rhs: Position<T>) -> Self {
        self.x = self.x + rhs.x;
        self.y = self.y + rhs.y;
        self
    }
}

impl<T: Sub<T, Output = T>> Sub<Position<T>> for Position<T> {
    type Output = Self;

    fn sub(mut self, rhs: Position<T>) -> Self {
        self.x = self.x - rhs.x;
        self.y = self.y - rhs.y;
        self
    }
}

/// 2D object size.
#[derive(PartialEq, Copy, Clone, Default, Debug)]
pub struct Size<T = u32> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub const fn new(width: T, height: T) -> Self {
        Self { width, height }
    }
}

impl<T> From<(T, T)> for Size<T> {
    fn from((width, height): (T, T)) -> Self {
        Self { width, height }
    }
}

impl From<Size> for Size<f32> {
    fn from(size: Size) -> Self {
        Self { width: size.width as f32, height: size.height as f32 }
    }
}

impl Mul<f64> for Size {
    type Output = Self;

    fn mul(mut self, scale: f64) -> Self {
        self.width = (self.width as f64 * scale).round() as u32;
        self.height = (self.height as f64 * scale).round() as u32;
        self
    }
}

/// Axis-aligned rectangle.
#[derive(PartialEq, Copy, Clone, Default, Debug)]
pub struct Rect {
    pub origin: Position<f32>,
    pub size: Size<f32>,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { origin: Position::new(x, y), size: Size::new(width, height) }
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Position<f32> {
        let x = self.origin.x + self.size.width / 2.;
        let y = self.origin.y + self.size.height / 2.;
        Position::new(x, y)
    }

    /// Length of the shorter side.
    pub fn min_side(&self) -> f32 {
        self.size.width.min(self.size.height)
    }
}

impl From<Size<f32>> for Rect {
    fn from(size: Size<f32>) -> Self {
        Self { origin: Position::default(), size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_size_rounds() {
        let size = Size::new(101, 50) * 1.5;
        assert_eq!(size, Size::new(152, 75));
    }

    #[test]
    fn rect_center() {
        let rect = Rect::new(10., 20., 100., 40.);
        assert_eq!(rect.center(), Position::new(60., 40.));
        assert_eq!(rect.min_side(), 40.);
    }
}
