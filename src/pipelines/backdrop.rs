use crate::pipelines::mk_render_pipeline;

/// Vertices are generated in the shader, so the backdrop needs no buffers.
pub const BACKDROP_VERTICES: u32 = 6;

pub fn mk_backdrop_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    atlas_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Backdrop Pipeline Layout"),
        bind_group_layouts: &[atlas_bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Backdrop Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("backdrop.wgsl").into()),
    };

    mk_render_pipeline(device, &layout, color_format, &[], shader, "Backdrop Pipeline")
}
