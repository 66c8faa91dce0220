//! Implementation of RenderContext trait for GraphicsContext.
//!
//! Bind calls only update the context's draw state. Each draw resolves that
//! state into a cached render pipeline plus bind groups, records one render
//! pass and submits it, so queued buffer writes always land before the draw
//! that follows them.

use crate::context::{DEPTH_FORMAT, DrawState, GraphicsContext, PipelineKey, VertexBinding};
use pyxis_core::profiling::profile_function;
use pyxis_test_utils::{
    GpuBuffer, GpuShaderModule, GpuTexture, RasterState, RenderContext, TEXTURE_SLOTS,
};
use std::ops::Range;
use wgpu::{BufferDescriptor, ShaderModuleDescriptor, TextureDescriptor};

enum DrawRange {
    Vertices(Range<u32>),
    Indices(Range<u32>),
}

impl GraphicsContext {
    fn pipeline_for(&self, key: &PipelineKey, shader: &GpuShaderModule) -> wgpu::RenderPipeline {
        let mut pipelines = self.pipelines.lock();
        if let Some(pipeline) = pipelines.get(key) {
            return pipeline.clone();
        }

        let module = shader.as_wgpu();
        let depth_stencil = depth_stencil_state(&key.raster, key.has_depth);

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Pyxis Render Pipeline"),
                layout: Some(&self.resources.pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: key.stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &key.attributes,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.color_format,
                        blend: key.raster.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: key.topology,
                    cull_mode: key.raster.cull_mode,
                    ..Default::default()
                },
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        tracing::debug!(shader = key.shader, topology = ?key.topology, "created render pipeline");
        pipelines.insert(key.clone(), pipeline.clone());
        pipeline
    }

    fn texture_bind_group(&self, textures: &[Option<GpuTexture>]) -> wgpu::BindGroup {
        let views: Vec<wgpu::TextureView> = textures
            .iter()
            .map(|texture| match texture {
                Some(texture) => texture
                    .as_wgpu()
                    .create_view(&wgpu::TextureViewDescriptor::default()),
                None => self.resources.white.clone(),
            })
            .collect();

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Pyxis Texture Bind Group"),
            layout: &self.resources.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&views[1]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.resources.sampler),
                },
            ],
        })
    }

    fn submit_draw(&self, topology: wgpu::PrimitiveTopology, range: DrawRange) {
        profile_function!();

        let (Range { start, end }, indexed) = match &range {
            DrawRange::Vertices(r) => (r.clone(), false),
            DrawRange::Indices(r) => (r.clone(), true),
        };
        if start >= end {
            return;
        }

        let state = self.state.lock();
        let DrawState {
            target: Some(target),
            shader: Some((shader, uniforms)),
            vertex: Some(VertexBinding {
                buffer: vertex_buffer,
                stride,
                attributes,
            }),
            ..
        } = &*state
        else {
            tracing::warn!("draw skipped: render target, shader or vertex buffer not bound");
            return;
        };
        let index = match (&state.index, indexed) {
            (Some(index), true) => Some(index),
            (None, true) => {
                tracing::warn!("indexed draw skipped: no index buffer bound");
                return;
            }
            (_, false) => None,
        };

        let key = PipelineKey {
            shader: shader.id(),
            raster: state.raster,
            stride: *stride,
            attributes: attributes.clone(),
            topology,
            color_format: target.format,
            has_depth: target.depth.is_some(),
        };
        let pipeline = self.pipeline_for(&key, shader);

        let uniform_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Pyxis Uniform Bind Group"),
            layout: &self.resources.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_wgpu().as_entire_binding(),
            }],
        });
        let texture_group = self.texture_bind_group(&state.textures);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pyxis Draw Encoder"),
            });
        {
            let mut pass = begin_pass(&mut encoder, target, None);
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &uniform_group, &[]);
            pass.set_bind_group(1, &texture_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.as_wgpu().slice(..));
            match index {
                Some((index_buffer, format)) => {
                    pass.set_index_buffer(index_buffer.as_wgpu().slice(..), *format);
                    pass.draw_indexed(start..end, 0, 0..1);
                }
                None => pass.draw(start..end, 0..1),
            }
        }
        self.queue.submit(Some(encoder.finish()));
    }
}

/// Depth state for a pipeline. Targets without a depth view get none, and
/// any depth test or write the raster state asked for is dropped.
fn depth_stencil_state(raster: &RasterState, has_depth: bool) -> Option<wgpu::DepthStencilState> {
    if !has_depth {
        if raster.depth_test || raster.depth_write {
            tracing::warn!("render target has no depth view, depth testing disabled for pipeline");
        }
        return None;
    }

    Some(wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: raster.depth_write,
        depth_compare: if raster.depth_test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &crate::RenderTarget,
    clear: Option<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    let color_load = clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear);
    let depth_load = if clear.is_some() {
        wgpu::LoadOp::Clear(1.0)
    } else {
        wgpu::LoadOp::Load
    };

    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Pyxis Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &target.color,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: color_load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: target.depth.as_ref().map(|view| {
            wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}

impl RenderContext for GraphicsContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let buffer = self.device.create_buffer(desc);
        GpuBuffer::from_wgpu(buffer)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        let wgpu_buffer = buffer.as_wgpu();
        self.queue.write_buffer(wgpu_buffer, offset, data);
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        buffer.as_wgpu().destroy();
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture {
        let texture = self.device.create_texture(desc);
        GpuTexture::from_wgpu(texture)
    }

    fn write_texture(&self, texture: &GpuTexture, data: &[u8]) {
        let bytes_per_pixel = texture.format().block_copy_size(None).unwrap_or(4);
        let size = wgpu::Extent3d {
            width: texture.width(),
            height: texture.height(),
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: texture.as_wgpu(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texture.width() * bytes_per_pixel),
                rows_per_image: Some(texture.height()),
            },
            size,
        );
    }

    fn create_shader_module(&self, desc: &ShaderModuleDescriptor) -> GpuShaderModule {
        let module = self.device.create_shader_module(desc.clone());
        GpuShaderModule::from_wgpu(module)
    }

    fn set_raster_state(&self, state: &RasterState) {
        self.state.lock().raster = *state;
    }

    fn bind_texture(&self, slot: u32, texture: Option<&GpuTexture>) {
        assert!(slot < TEXTURE_SLOTS, "texture slot {} out of range", slot);
        self.state.lock().textures[slot as usize] = texture.cloned();
    }

    fn use_shader(&self, shader: &GpuShaderModule, uniforms: &GpuBuffer) {
        self.state.lock().shader = Some((shader.clone(), uniforms.clone()));
    }

    fn bind_vertex_buffer(
        &self,
        buffer: &GpuBuffer,
        stride: u64,
        attributes: &[wgpu::VertexAttribute],
    ) {
        self.state.lock().vertex = Some(VertexBinding {
            buffer: buffer.clone(),
            stride,
            attributes: attributes.to_vec(),
        });
    }

    fn bind_index_buffer(&self, buffer: &GpuBuffer, format: wgpu::IndexFormat) {
        self.state.lock().index = Some((buffer.clone(), format));
    }

    fn draw(&self, topology: wgpu::PrimitiveTopology, vertices: Range<u32>) {
        self.submit_draw(topology, DrawRange::Vertices(vertices));
    }

    fn draw_indexed(&self, topology: wgpu::PrimitiveTopology, indices: Range<u32>) {
        self.submit_draw(topology, DrawRange::Indices(indices));
    }

    fn clear(&self, color: wgpu::Color) {
        let state = self.state.lock();
        let Some(target) = &state.target else {
            tracing::warn!("clear skipped: no render target bound");
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pyxis Clear Encoder"),
            });
        drop(begin_pass(&mut encoder, target, Some(color)));
        self.queue.submit(Some(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyxis_test_utils::MockRenderContext;

    #[test]
    fn test_render_context_trait_object() {
        // GraphicsContext and MockRenderContext are interchangeable behind the trait.
        let mock_ctx = MockRenderContext::new();

        fn uses_render_context(ctx: &dyn RenderContext) {
            let buffer = ctx.create_buffer(&BufferDescriptor {
                label: Some("Test Buffer"),
                size: 256,
                usage: wgpu::BufferUsages::UNIFORM,
                mapped_at_creation: false,
            });

            ctx.write_buffer(&buffer, 0, &[0u8; 256]);
            ctx.set_raster_state(&RasterState::overlay(None));
            ctx.draw(wgpu::PrimitiveTopology::PointList, 0..1);
        }

        uses_render_context(&mock_ctx);

        assert_eq!(mock_ctx.calls().len(), 4);
        assert_eq!(mock_ctx.count_draws(), 1);
    }

    #[test]
    fn test_depth_state_requires_depth_view() {
        assert!(depth_stencil_state(&RasterState::opaque_3d(), false).is_none());
        assert!(depth_stencil_state(&RasterState::overlay(None), false).is_none());

        let depth = depth_stencil_state(&RasterState::opaque_3d(), true).unwrap();
        assert_eq!(depth.format, DEPTH_FORMAT);
        assert!(depth.depth_write_enabled);
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);

        let overlay = depth_stencil_state(&RasterState::overlay(None), true).unwrap();
        assert!(!overlay.depth_write_enabled);
        assert_eq!(overlay.depth_compare, wgpu::CompareFunction::Always);
    }
}
