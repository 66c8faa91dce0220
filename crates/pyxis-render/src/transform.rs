use glam::{Affine2, Vec2};
use std::ops::Mul;

/// 2D affine transform applied to every emitted vertex position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform(pub Affine2);

impl WorldTransform {
    pub const IDENTITY: Self = Self(Affine2::IDENTITY);

    pub fn from_translation(translation: Vec2) -> Self {
        Self(Affine2::from_translation(translation))
    }

    /// Counter-clockwise rotation in radians about the origin.
    pub fn from_rotation(angle: f32) -> Self {
        Self(Affine2::from_angle(angle))
    }

    pub fn from_scale(scale: Vec2) -> Self {
        Self(Affine2::from_scale(scale))
    }

    /// Apply `self` first, then `next`.
    pub fn then(self, next: WorldTransform) -> Self {
        Self(next.0 * self.0)
    }

    #[inline]
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.0.transform_point2(point)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// `a * b` applies `b` first, matching matrix composition.
impl Mul for WorldTransform {
    type Output = WorldTransform;

    fn mul(self, rhs: WorldTransform) -> WorldTransform {
        Self(self.0 * rhs.0)
    }
}

impl From<Affine2> for WorldTransform {
    fn from(affine: Affine2) -> Self {
        Self(affine)
    }
}
