//! Pyxis Render
//!
//! Immediate-mode 2D drawing on top of a batching geometry pipeline, plus a
//! small static-mesh path for 3D.
//!
//! Drawing calls go through [`RenderingContext`]. Each primitive computes its
//! vertices under the current [`WorldTransform`], asks the
//! [`BatchAccumulator`] for a batch matching its [`RenderState`], and appends
//! into that batch's [`GeometryStore`]. A batch is only flushed to the GPU
//! when the state changes or the frame ends, so runs of same-state primitives
//! cost one draw call.
//!
//! # Example
//!
//! ```ignore
//! use glam::Vec2;
//! use pyxis_render::*;
//!
//! let graphics = GraphicsContext::new_owned_sync()?;
//! graphics.set_render_target(RenderTarget::new(view, format));
//!
//! let mut ctx = RenderingContext::new(graphics.clone());
//! ctx.begin_frame(Size::new(800.0, 600.0));
//! ctx.draw_rectangle(Rect::new(10.0, 10.0, 100.0, 50.0), Color::RED, BlendMode::Alpha);
//! ctx.draw_circle(Circle::new(Vec2::new(200.0, 200.0), 40.0), 32, Color::WHITE, BlendMode::Alpha);
//! let stats = ctx.end_frame();
//! assert_eq!(stats.draw_calls, 1);
//! ```

mod batch;
mod blend;
mod color;
mod config;
mod context;
mod context_impl;
mod emitter;
mod error;
mod font;
mod geometry_store;
mod mesh;
mod rendering_context;
mod shader;
mod texture;
mod transform;
mod vertex;

pub use batch::*;
pub use blend::*;
pub use color::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use font::*;
pub use geometry_store::*;
pub use mesh::*;
pub use rendering_context::*;
pub use shader::*;
pub use texture::*;
pub use transform::*;
pub use vertex::*;

pub use pyxis_core::geometry::{Circle, Rect, Size};
pub use pyxis_test_utils::{RasterState, RenderContext};

// Re-export wgpu so callers can build render targets without a direct dependency.
pub use wgpu;
