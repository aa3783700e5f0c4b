//! The atlas-textured cube.
//!
//! The cube is really a box: its side faces share the 4:3 aspect of the side
//! tiles and its caps are square like the cap tiles, so no face distorts its
//! image. Every face owns four vertices (24 in total) so that each can carry
//! its own atlas UVs.

use anyhow::Result;
use wgpu::util::DeviceExt;

use crate::atlas::{AtlasLayout, SLOT_COUNT};

/// Half extent along x and z.
pub const HALF_WIDTH: f32 = 0.5 + 1.0 / 3.0 / 2.0;
/// Half extent along y.
pub const HALF_HEIGHT: f32 = 0.5;

pub const VERTEX_COUNT: usize = SLOT_COUNT * 4;
pub const INDEX_COUNT: usize = SLOT_COUNT * 6;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl CubeVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Cube faces in vertex-buffer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    PosZ,
    PosX,
    NegZ,
    NegX,
    Top,
    Bottom,
}

impl Face {
    pub const ALL: [Face; SLOT_COUNT] = [
        Face::PosZ,
        Face::PosX,
        Face::NegZ,
        Face::NegX,
        Face::Top,
        Face::Bottom,
    ];

    /// Atlas slot holding this face's image. The four side faces wrap around
    /// the box in the same order as the side tiles.
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Corner positions as signs of (x, y, z), starting top-left as seen from
    /// outside and continuing clockwise.
    fn corners(self) -> [[f32; 3]; 4] {
        match self {
            Face::PosZ => [[-1., 1., 1.], [1., 1., 1.], [1., -1., 1.], [-1., -1., 1.]],
            Face::PosX => [[1., 1., 1.], [1., 1., -1.], [1., -1., -1.], [1., -1., 1.]],
            Face::NegZ => [[1., 1., -1.], [-1., 1., -1.], [-1., -1., -1.], [1., -1., -1.]],
            Face::NegX => [[-1., 1., -1.], [-1., 1., 1.], [-1., -1., 1.], [-1., -1., -1.]],
            Face::Top => [[-1., 1., -1.], [1., 1., -1.], [1., 1., 1.], [-1., 1., 1.]],
            Face::Bottom => [[-1., -1., -1.], [1., -1., -1.], [1., -1., 1.], [-1., -1., 1.]],
        }
    }

    /// Two triangles over this face's vertices, relative to the face's first vertex.
    fn triangles(self) -> [u16; 6] {
        match self {
            Face::Bottom => [0, 1, 2, 3, 0, 2],
            _ => [2, 1, 0, 2, 0, 3],
        }
    }
}

/// CPU-side vertex and index data of the cube.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeGeometry {
    pub vertices: Vec<CubeVertex>,
    pub indices: Vec<u16>,
}

impl CubeGeometry {
    /// Lay the cube out so each face samples its own slot of `layout`.
    pub fn new(layout: &AtlasLayout) -> Result<Self> {
        let mut vertices = Vec::with_capacity(VERTEX_COUNT);
        let mut indices = Vec::with_capacity(INDEX_COUNT);
        for (face_idx, face) in Face::ALL.into_iter().enumerate() {
            let uv = layout.uv_rect(face.slot())?;
            let tex_coords = [[uv.u0, uv.v0], [uv.u1, uv.v0], [uv.u1, uv.v1], [uv.u0, uv.v1]];
            for (corner, tex_coords) in face.corners().into_iter().zip(tex_coords) {
                vertices.push(CubeVertex {
                    position: [
                        corner[0] * HALF_WIDTH,
                        corner[1] * HALF_HEIGHT,
                        corner[2] * HALF_WIDTH,
                    ],
                    tex_coords,
                });
            }
            let base = (face_idx * 4) as u16;
            indices.extend(face.triangles().map(|i| base + i));
        }
        Ok(Self { vertices, indices })
    }
}

/// GPU buffers of the cube.
#[derive(Debug)]
pub struct CubeMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl CubeMesh {
    pub fn new(device: &wgpu::Device, geometry: &CubeGeometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_elements: geometry.indices.len() as u32,
        }
    }
}
