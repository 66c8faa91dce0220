//! Math types.
//!
//! CPU-side math comes straight from [`glam`]. The `packed` module holds
//! `#[repr(C)]` vectors that can be cast to bytes for vertex and uniform
//! uploads.
//!
//! ```
//! use pyxis_core::math::{Affine2, Vec2};
//!
//! let t = Affine2::from_translation(Vec2::new(10.0, 0.0));
//! assert_eq!(t.transform_point2(Vec2::ZERO), Vec2::new(10.0, 0.0));
//! ```

pub mod fast {
    pub use glam::*;
}

/// Packed vector types for GPU buffer uploads.
///
/// ```
/// use pyxis_core::math::{PackedVec2, Vec2};
///
/// let packed = PackedVec2::from(Vec2::new(1.0, 2.0));
/// let bytes: &[u8] = bytemuck::bytes_of(&packed);
/// assert_eq!(bytes.len(), 8);
/// ```
pub mod packed {
    use bytemuck::{Pod, Zeroable};

    /// 8 bytes, two `f32`.
    #[repr(C)]
    #[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
    pub struct Vec2 {
        pub x: f32,
        pub y: f32,
    }

    /// 12 bytes, three `f32`. Not 16-byte aligned; pad when used in uniforms.
    #[repr(C)]
    #[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
    pub struct Vec3 {
        pub x: f32,
        pub y: f32,
        pub z: f32,
    }

    /// 16 bytes, four `f32`.
    #[repr(C)]
    #[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
    pub struct Vec4 {
        pub x: f32,
        pub y: f32,
        pub z: f32,
        pub w: f32,
    }

    impl From<glam::Vec2> for Vec2 {
        fn from(v: glam::Vec2) -> Self {
            Self { x: v.x, y: v.y }
        }
    }

    impl From<Vec2> for glam::Vec2 {
        fn from(v: Vec2) -> Self {
            glam::Vec2::new(v.x, v.y)
        }
    }

    impl From<glam::Vec3> for Vec3 {
        fn from(v: glam::Vec3) -> Self {
            Self {
                x: v.x,
                y: v.y,
                z: v.z,
            }
        }
    }

    impl From<Vec3> for glam::Vec3 {
        fn from(v: Vec3) -> Self {
            glam::Vec3::new(v.x, v.y, v.z)
        }
    }

    impl From<glam::Vec4> for Vec4 {
        fn from(v: glam::Vec4) -> Self {
            Self {
                x: v.x,
                y: v.y,
                z: v.z,
                w: v.w,
            }
        }
    }

    static_assertions::assert_eq_size!(Vec2, [u8; 8]);
    static_assertions::assert_eq_size!(Vec3, [u8; 12]);
    static_assertions::assert_eq_size!(Vec4, [u8; 16]);
}

pub use fast::*;
pub use packed::{Vec2 as PackedVec2, Vec3 as PackedVec3, Vec4 as PackedVec4};
