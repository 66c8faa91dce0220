//! Blend mode presets.

/// How a batch's fragments combine with the render target.
///
/// Part of the batch [`RenderState`](crate::RenderState): primitives drawn
/// with different blend modes never share a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Source replaces destination.
    Replace,

    /// `src.rgb * src.a + dst.rgb * (1 - src.a)`
    #[default]
    Alpha,

    /// `src.rgb + dst.rgb * (1 - src.a)`
    PremultipliedAlpha,

    /// `src.rgb * src.a + dst.rgb`
    Additive,

    /// `src.rgb * dst.rgb`
    Multiply,

    /// Custom blend state.
    Custom(wgpu::BlendState),
}

impl BlendMode {
    /// Blend state handed to the raster stage. `Replace` disables blending.
    pub fn to_blend_state(self) -> Option<wgpu::BlendState> {
        match self {
            BlendMode::Replace => None,
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendMode::PremultipliedAlpha => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            BlendMode::Additive => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            BlendMode::Multiply => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Dst,
                    dst_factor: wgpu::BlendFactor::Zero,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::DstAlpha,
                    dst_factor: wgpu::BlendFactor::Zero,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            BlendMode::Custom(state) => Some(state),
        }
    }
}

impl From<wgpu::BlendState> for BlendMode {
    fn from(state: wgpu::BlendState) -> Self {
        BlendMode::Custom(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_disables_blending() {
        assert_eq!(BlendMode::Replace.to_blend_state(), None);
    }

    #[test]
    fn default_is_alpha() {
        assert_eq!(
            BlendMode::default().to_blend_state(),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
    }
}
