//! Offscreen rendering of a single frame.
//!
//! Builds a headless device, draws the scene exactly as the windowed viewer
//! would on its first frame and reads the colour target back into an
//! [`RgbaImage`].

use std::iter;

use anyhow::{Context as _, Result, anyhow, ensure};
use image::RgbaImage;

use crate::{
    atlas::Atlas,
    camera::{CameraResources, OrbitCamera, Projection},
    config::ViewerConfig,
    data_structures::texture::Texture,
    render::{Scene, encode_frame},
};

pub const SNAPSHOT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// `bytes_per_row` of a buffer copy must be a multiple of this.
const ROW_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    unpadded.div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT
}

/// Drop the per-row padding of a mapped readback buffer.
fn unpad_rows(data: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
    let padded = padded_bytes_per_row(width) as usize;
    let unpadded = (width * 4) as usize;
    ensure!(
        height == 0 || data.len() >= padded * (height as usize - 1) + unpadded,
        "readback buffer too small for {width}x{height}"
    );
    let mut pixels = Vec::with_capacity(unpadded * height as usize);
    for row in data.chunks(padded).take(height as usize) {
        pixels.extend_from_slice(&row[..unpadded]);
    }
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow!("cannot build a {width}x{height} image from the readback"))
}

/// Reject sizes the device cannot allocate a render target for.
fn check_size(width: u32, height: u32, max_dimension: u32) -> Result<()> {
    ensure!(
        width > 0 && height > 0,
        "snapshot size must be non-zero, got {width}x{height}"
    );
    ensure!(
        width <= max_dimension && height <= max_dimension,
        "snapshot size {width}x{height} exceeds the GPU's texture limit of {max_dimension}"
    );
    Ok(())
}

async fn headless_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("no suitable GPU adapter for offscreen rendering")?;
    log::info!("Snapshot adapter {:?}", adapter.get_info());

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("snapshot device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
        })
        .await
        .context("failed to request a device")?;
    Ok((device, queue))
}

/// Render one frame of `atlas` on the cube at `width`x`height` with the
/// camera in its initial pose.
pub async fn render_snapshot(
    config: &ViewerConfig,
    atlas: Atlas,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    check_size(width, height, u32::MAX)?;
    let (device, queue) = headless_device().await?;
    check_size(width, height, device.limits().max_texture_dimension_2d)?;

    let mut camera = CameraResources::new(
        &device,
        OrbitCamera::new(cgmath::Point3::new(0.0, 0.0, 0.0), config.camera_distance),
        Projection::new(width, height, std::f32::consts::FRAC_PI_4, 0.01, 1000.0),
        [width, height],
    );
    camera.update(&queue);

    let scene = Scene::new(
        &device,
        &queue,
        SNAPSHOT_FORMAT,
        &camera.bind_group_layout,
        atlas,
        config.backdrop,
    )?;

    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Snapshot Output Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SNAPSHOT_FORMAT,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(&device, [width, height], "snapshot_depth");

    let bytes_per_row = padded_bytes_per_row(width);
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Snapshot Readback Buffer"),
        size: (bytes_per_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Snapshot Encoder"),
    });
    encode_frame(
        &mut encoder,
        &target_view,
        &depth.view,
        config.clear_colour,
        &scene,
        &camera.bind_group,
    );
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        extent,
    );
    queue.submit(iter::once(encoder.finish()));

    // The mapping has to be requested before polling, otherwise the wait never resolves.
    let buffer_slice = output_buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .context("device lost while waiting for the snapshot")?;
    rx.receive()
        .await
        .context("readback channel closed")?
        .context("failed to map the readback buffer")?;

    let image = {
        let data = buffer_slice.get_mapped_range();
        unpad_rows(&data, width, height)?
    };
    output_buffer.unmap();
    log::info!("Rendered {width}x{height} snapshot");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_the_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(100), 512);
    }

    #[test]
    fn unpadding_keeps_only_visible_pixels() {
        let (width, height) = (3, 2);
        let padded = padded_bytes_per_row(width) as usize;
        let mut data = vec![0xAA; padded * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let i = y * padded + x * 4;
                data[i..i + 4].copy_from_slice(&[x as u8, y as u8, 7, 255]);
            }
        }
        let image = unpad_rows(&data, width, height).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [2, 1, 7, 255]);
        assert!(image.pixels().all(|p| p.0[2] == 7));
    }

    #[test]
    fn size_must_fit_the_texture_limit() {
        assert!(check_size(2048, 2048, 8192).is_ok());
        assert!(check_size(8192, 1, 8192).is_ok());
        let err = check_size(8193, 600, 8192).unwrap_err();
        assert!(err.to_string().contains("8192"), "{err}");
        assert!(check_size(600, 20_000, 8192).is_err());
        assert!(check_size(0, 600, 8192).is_err());
    }

    #[test]
    fn short_buffer_is_an_error() {
        assert!(unpad_rows(&[0; 16], 4, 4).is_err());
        assert!(unpad_rows(&[0; 8], 4, 1).is_err());
    }
}
