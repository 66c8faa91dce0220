//! Plain geometry value types shared by the drawing API.

use glam::Vec2;
use std::ops::Mul;

/// Axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Rect<f32> {
    /// Rectangle at `position` with the given size.
    pub fn from_pos_size(position: Vec2, size: Size<f32>) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Size<f32> {
        Size::new(self.width, self.height)
    }

    /// Corners in `[top-left, top-right, bottom-left, bottom-right]` order.
    pub fn corners(&self) -> [Vec2; 4] {
        let (l, t) = (self.x, self.y);
        let (r, b) = (self.x + self.width, self.y + self.height);
        [
            Vec2::new(l, t),
            Vec2::new(r, t),
            Vec2::new(l, b),
            Vec2::new(r, b),
        ]
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub const fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    pub fn cast<U: From<T>>(self) -> Size<U> {
        Size {
            width: U::from(self.width),
            height: U::from(self.height),
        }
    }
}

impl<T: Mul + Copy> Mul<T> for Size<T> {
    type Output = Size<<T as Mul>::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Size {
            width: self.width * rhs,
            height: self.height * rhs,
        }
    }
}

/// Circle described by its center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Point on the perimeter at `angle` radians, measured from +X towards +Y.
    pub fn point_at(&self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        self.center + Vec2::new(cos, sin) * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_corners_are_tl_tr_bl_br() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(
            rect.corners(),
            [
                Vec2::new(10.0, 20.0),
                Vec2::new(40.0, 20.0),
                Vec2::new(10.0, 60.0),
                Vec2::new(40.0, 60.0),
            ]
        );
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(rect.contains(Vec2::new(9.9, 9.9)));
        assert!(!rect.contains(Vec2::new(10.0, 5.0)));
    }

    #[test]
    fn size_scales() {
        assert_eq!(Size::new(2.0, 3.0) * 2.0, Size::new(4.0, 6.0));
        let widened: Size<u64> = Size::new(4u32, 5u32).cast();
        assert_eq!(widened, Size::new(4u64, 5u64));
    }

    #[test]
    fn circle_point_at_zero_is_on_positive_x() {
        let circle = Circle::new(Vec2::new(1.0, 1.0), 2.0);
        let p = circle.point_at(0.0);
        assert!((p - Vec2::new(3.0, 1.0)).length() < 1e-6);
    }
}
