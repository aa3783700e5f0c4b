//! Scene resources and frame encoding.
//!
//! [`Scene`] owns everything that is drawn: the CPU atlas and its GPU copy,
//! the cube buffers and the pipelines. [`encode_frame`] records one complete
//! frame into a command encoder and is shared by the windowed app and the
//! offscreen snapshot.

use anyhow::{Context as _, Result};

use crate::{
    atlas::Atlas,
    data_structures::{
        cube::{CubeGeometry, CubeMesh},
        texture::{self, Texture},
    },
    pipelines::{Pipelines, backdrop::BACKDROP_VERTICES},
};

/// Draw calls for the scene's objects on a render pass.
pub trait DrawScene {
    fn draw_cube(
        &mut self,
        mesh: &CubeMesh,
        atlas_bind_group: &wgpu::BindGroup,
        camera_bind_group: &wgpu::BindGroup,
    );

    fn draw_backdrop(&mut self, atlas_bind_group: &wgpu::BindGroup);
}

impl DrawScene for wgpu::RenderPass<'_> {
    fn draw_cube(
        &mut self,
        mesh: &CubeMesh,
        atlas_bind_group: &wgpu::BindGroup,
        camera_bind_group: &wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        self.set_bind_group(0, atlas_bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_backdrop(&mut self, atlas_bind_group: &wgpu::BindGroup) {
        self.set_bind_group(0, atlas_bind_group, &[]);
        self.draw(0..BACKDROP_VERTICES, 0..1);
    }
}

#[derive(Debug)]
pub struct Scene {
    pub atlas: Atlas,
    atlas_texture: Texture,
    atlas_bind_group: wgpu::BindGroup,
    mesh: CubeMesh,
    pipelines: Pipelines,
    pub backdrop: bool,
}

impl Scene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        mut atlas: Atlas,
        backdrop: bool,
    ) -> Result<Self> {
        let geometry = CubeGeometry::new(atlas.layout())?;
        let mesh = CubeMesh::new(device, &geometry);

        let atlas_texture = Texture::create_atlas(device, queue, atlas.image(), "atlas");
        // Freshly uploaded, nothing to sync yet.
        atlas.take_dirty();
        let atlas_layout = texture::atlas_bind_group_layout(device);
        let sampler = atlas_texture
            .sampler
            .as_ref()
            .context("atlas texture was created without a sampler")?;
        let atlas_bind_group =
            texture::atlas_bind_group(device, &atlas_layout, &atlas_texture, sampler);

        let pipelines = Pipelines::new(device, color_format, &atlas_layout, camera_bind_group_layout);

        Ok(Self {
            atlas,
            atlas_texture,
            atlas_bind_group,
            mesh,
            pipelines,
            backdrop,
        })
    }

    /// Push the CPU atlas to the GPU if it changed. Returns whether an upload happened.
    pub fn sync_atlas(&mut self, queue: &wgpu::Queue) -> Result<bool> {
        if !self.atlas.take_dirty() {
            return Ok(false);
        }
        self.atlas_texture.update(queue, self.atlas.image())?;
        log::debug!(
            "Uploaded atlas to the GPU ({} of 6 slots filled)",
            self.atlas.filled()
        );
        Ok(true)
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, camera_bind_group: &wgpu::BindGroup) {
        if self.backdrop {
            render_pass.set_pipeline(&self.pipelines.backdrop);
            render_pass.draw_backdrop(&self.atlas_bind_group);
        }
        render_pass.set_pipeline(&self.pipelines.cube);
        render_pass.draw_cube(&self.mesh, &self.atlas_bind_group, camera_bind_group);
    }
}

/// Record a full frame: clear colour and depth, then draw `scene`.
pub fn encode_frame(
    encoder: &mut wgpu::CommandEncoder,
    color_view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
    clear_colour: wgpu::Color,
    scene: &Scene,
    camera_bind_group: &wgpu::BindGroup,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    scene.draw(&mut render_pass, camera_bind_group);
}
