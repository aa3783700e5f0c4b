use crate::{data_structures::cube::CubeVertex, pipelines::mk_render_pipeline};

/// Pipeline for the cube: atlas at group 0, camera at group 1.
pub fn mk_cube_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    atlas_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Cube Pipeline Layout"),
        bind_group_layouts: &[atlas_bind_group_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Cube Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("cube.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &layout,
        color_format,
        &[CubeVertex::desc()],
        shader,
        "Cube Pipeline",
    )
}
