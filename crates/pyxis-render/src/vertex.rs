//! Vertex layouts and the vertex types that use them.
//!
//! A [`VertexLayout`] is a set of attribute flags. Attributes are always laid
//! out in the same order inside a vertex (position, normal, texcoord A,
//! texcoord B, color), each with a fixed shader location, so a layout alone
//! determines the stride and every attribute offset.
//!
//! | attribute    | bytes | format     | location |
//! |--------------|-------|------------|----------|
//! | `POSITION2`  | 8     | Float32x2  | 0        |
//! | `POSITION3`  | 12    | Float32x3  | 0        |
//! | `NORMAL2`    | 8     | Float32x2  | 1        |
//! | `NORMAL3`    | 12    | Float32x3  | 1        |
//! | `TEXCOORD_A` | 8     | Float32x2  | 2        |
//! | `TEXCOORD_B` | 8     | Float32x2  | 3        |
//! | `COLOR4`     | 4     | Unorm8x4   | 4        |

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::borrow::Cow;
use std::mem::size_of;

bitflags! {
    /// Attribute set describing the byte layout of one vertex.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexLayout: u32 {
        const POSITION2 = 1 << 0;
        const POSITION3 = 1 << 1;
        const NORMAL2 = 1 << 2;
        const NORMAL3 = 1 << 3;
        const TEXCOORD_A = 1 << 4;
        const TEXCOORD_B = 1 << 5;
        const COLOR4 = 1 << 6;
    }
}

pub const POSITION_LOCATION: u32 = 0;
pub const NORMAL_LOCATION: u32 = 1;
pub const TEXCOORD_A_LOCATION: u32 = 2;
pub const TEXCOORD_B_LOCATION: u32 = 3;
pub const COLOR_LOCATION: u32 = 4;

// Canonical attribute order.
const ATTRIBUTE_TABLE: [(VertexLayout, wgpu::VertexFormat, u32); 7] = [
    (VertexLayout::POSITION2, wgpu::VertexFormat::Float32x2, POSITION_LOCATION),
    (VertexLayout::POSITION3, wgpu::VertexFormat::Float32x3, POSITION_LOCATION),
    (VertexLayout::NORMAL2, wgpu::VertexFormat::Float32x2, NORMAL_LOCATION),
    (VertexLayout::NORMAL3, wgpu::VertexFormat::Float32x3, NORMAL_LOCATION),
    (VertexLayout::TEXCOORD_A, wgpu::VertexFormat::Float32x2, TEXCOORD_A_LOCATION),
    (VertexLayout::TEXCOORD_B, wgpu::VertexFormat::Float32x2, TEXCOORD_B_LOCATION),
    (VertexLayout::COLOR4, wgpu::VertexFormat::Unorm8x4, COLOR_LOCATION),
];

static POSITION_COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 4 => Unorm8x4];

static POSITION_TEXCOORD_COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x2, 2 => Float32x2, 4 => Unorm8x4];

impl VertexLayout {
    /// Untextured 2D preset: position2 + color4.
    pub const POSITION2_COLOR: Self = Self::POSITION2.union(Self::COLOR4);

    /// Textured 2D preset: position2 + texcoord A + color4.
    pub const POSITION2_TEXCOORD_COLOR: Self = Self::POSITION2
        .union(Self::TEXCOORD_A)
        .union(Self::COLOR4);

    /// Static mesh layout: position3 + normal3 + texcoord A.
    pub const POSITION3_NORMAL3_TEXCOORD: Self = Self::POSITION3
        .union(Self::NORMAL3)
        .union(Self::TEXCOORD_A);

    /// Size of one vertex in bytes.
    pub const fn stride(self) -> usize {
        let mut stride = 0;
        if self.contains(Self::POSITION2) {
            stride += 8;
        }
        if self.contains(Self::POSITION3) {
            stride += 12;
        }
        if self.contains(Self::NORMAL2) {
            stride += 8;
        }
        if self.contains(Self::NORMAL3) {
            stride += 12;
        }
        if self.contains(Self::TEXCOORD_A) {
            stride += 8;
        }
        if self.contains(Self::TEXCOORD_B) {
            stride += 8;
        }
        if self.contains(Self::COLOR4) {
            stride += 4;
        }
        stride
    }

    /// At most one position and one normal flavor may be present.
    pub const fn is_valid(self) -> bool {
        !(self.contains(Self::POSITION2) && self.contains(Self::POSITION3))
            && !(self.contains(Self::NORMAL2) && self.contains(Self::NORMAL3))
    }

    /// Vertex attributes for binding, with offsets in canonical order.
    ///
    /// The two 2D presets return static tables; every other layout is walked
    /// attribute by attribute.
    pub fn attributes(self) -> Cow<'static, [wgpu::VertexAttribute]> {
        if self == Self::POSITION2_COLOR {
            Cow::Borrowed(&POSITION_COLOR_ATTRIBUTES[..])
        } else if self == Self::POSITION2_TEXCOORD_COLOR {
            Cow::Borrowed(&POSITION_TEXCOORD_COLOR_ATTRIBUTES[..])
        } else {
            Cow::Owned(self.walk_attributes())
        }
    }

    fn walk_attributes(self) -> Vec<wgpu::VertexAttribute> {
        let mut offset = 0;
        let mut attributes = Vec::with_capacity(ATTRIBUTE_TABLE.len());
        for (flag, format, shader_location) in ATTRIBUTE_TABLE {
            if self.contains(flag) {
                attributes.push(wgpu::VertexAttribute {
                    format,
                    offset,
                    shader_location,
                });
                offset += format.size();
            }
        }
        attributes
    }
}

/// A plain-data vertex with a fixed [`VertexLayout`].
///
/// The struct's fields must follow the canonical attribute order and its size
/// must equal `LAYOUT.stride()`.
pub trait Vertex: Pod {
    const LAYOUT: VertexLayout;
}

/// Untextured 2D vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 2],
    pub color: [u8; 4],
}

impl ColorVertex {
    pub const fn new(position: [f32; 2], color: [u8; 4]) -> Self {
        Self { position, color }
    }
}

impl Vertex for ColorVertex {
    const LAYOUT: VertexLayout = VertexLayout::POSITION2_COLOR;
}

/// Textured 2D vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

impl TexturedVertex {
    pub const fn new(position: [f32; 2], uv: [f32; 2], color: [u8; 4]) -> Self {
        Self {
            position,
            uv,
            color,
        }
    }
}

impl Vertex for TexturedVertex {
    const LAYOUT: VertexLayout = VertexLayout::POSITION2_TEXCOORD_COLOR;
}

/// Static mesh vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex for MeshVertex {
    const LAYOUT: VertexLayout = VertexLayout::POSITION3_NORMAL3_TEXCOORD;
}

const_assert_eq!(size_of::<ColorVertex>(), ColorVertex::LAYOUT.stride());
const_assert_eq!(size_of::<TexturedVertex>(), TexturedVertex::LAYOUT.stride());
const_assert_eq!(size_of::<MeshVertex>(), MeshVertex::LAYOUT.stride());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_sums_attribute_sizes() {
        assert_eq!(VertexLayout::POSITION2_COLOR.stride(), 12);
        assert_eq!(VertexLayout::POSITION2_TEXCOORD_COLOR.stride(), 20);
        assert_eq!(VertexLayout::POSITION3_NORMAL3_TEXCOORD.stride(), 32);
        assert_eq!(
            (VertexLayout::POSITION2 | VertexLayout::NORMAL2 | VertexLayout::TEXCOORD_B).stride(),
            24
        );
        assert_eq!(VertexLayout::all().stride(), 8 + 12 + 8 + 12 + 8 + 8 + 4);
        assert_eq!(VertexLayout::empty().stride(), 0);
    }

    #[test]
    fn presets_match_generic_walk() {
        for layout in [
            VertexLayout::POSITION2_COLOR,
            VertexLayout::POSITION2_TEXCOORD_COLOR,
        ] {
            assert_eq!(layout.attributes().as_ref(), layout.walk_attributes().as_slice());
            assert!(matches!(layout.attributes(), Cow::Borrowed(_)));
        }
    }

    #[test]
    fn generic_walk_uses_canonical_order_and_locations() {
        let layout = VertexLayout::POSITION3
            | VertexLayout::NORMAL3
            | VertexLayout::TEXCOORD_A
            | VertexLayout::TEXCOORD_B
            | VertexLayout::COLOR4;
        let attributes = layout.attributes();

        let summary: Vec<_> = attributes
            .iter()
            .map(|a| (a.shader_location, a.offset))
            .collect();
        assert_eq!(summary, vec![(0, 0), (1, 12), (2, 24), (3, 32), (4, 40)]);
        assert_eq!(attributes[4].format, wgpu::VertexFormat::Unorm8x4);
    }

    #[test]
    fn layout_validity() {
        assert!(VertexLayout::POSITION2_COLOR.is_valid());
        assert!(!(VertexLayout::POSITION2 | VertexLayout::POSITION3).is_valid());
        assert!(!(VertexLayout::NORMAL2 | VertexLayout::NORMAL3).is_valid());
    }
}
