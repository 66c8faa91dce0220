//! GPU seam and test utilities for Pyxis.
//!
//! - [`RenderContext`]: the object-safe trait every GPU-facing component in
//!   `pyxis-render` talks to. It exposes resource creation plus a small
//!   "bind, then draw" command set.
//! - GPU handle wrappers ([`GpuBuffer`], [`GpuTexture`], [`GpuShaderModule`])
//!   that hold either a real wgpu object or a mock id.
//! - `MockRenderContext` (feature `mock`): records every call and tracks
//!   bound state so tests can assert on draws without a GPU.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use pyxis_test_utils::{MockRenderContext, RenderContext};
//! use wgpu::*;
//!
//! let mock = MockRenderContext::new();
//! let buffer = mock.create_buffer(&BufferDescriptor {
//!     label: Some("test_buffer"),
//!     size: 1024,
//!     usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
//!     mapped_at_creation: false,
//! });
//! mock.bind_vertex_buffer(&buffer, 12, &[]);
//! mock.draw(PrimitiveTopology::TriangleList, 0..3);
//!
//! assert_eq!(mock.count_buffer_creates(), 1);
//! assert_eq!(mock.draws()[0].count, 3);
//! # }
//! ```
//!
//! All handle types are owned and cheap to clone, so nothing here carries a
//! lifetime parameter. Mock state lives behind `parking_lot::Mutex` so the
//! trait's `&self` methods can record.

pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_context;

pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_context::*;
