use crate::Color;

/// Tunables for a [`RenderingContext`](crate::RenderingContext).
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Initial size of the batch vertex buffer, in bytes.
    pub initial_vertex_bytes: usize,
    /// Initial capacity of the batch index buffer, in indices.
    pub initial_index_capacity: usize,
    /// Segment count used when a circle is drawn with `segments == 0`.
    pub circle_segments: u32,
    /// Color the target is cleared to at the start of each frame. `None` keeps
    /// the previous contents.
    pub clear_color: Option<Color>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            initial_vertex_bytes: 64 * 1024,
            initial_index_capacity: 16 * 1024,
            circle_segments: 36,
            clear_color: Some(Color::BLACK),
        }
    }
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertex_bytes(mut self, bytes: usize) -> Self {
        self.initial_vertex_bytes = bytes;
        self
    }

    pub fn with_index_capacity(mut self, indices: usize) -> Self {
        self.initial_index_capacity = indices;
        self
    }

    pub fn with_circle_segments(mut self, segments: u32) -> Self {
        self.circle_segments = segments.max(3);
        self
    }

    pub fn with_clear_color(mut self, color: Option<Color>) -> Self {
        self.clear_color = color;
        self
    }
}
