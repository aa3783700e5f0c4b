//! Asset loading.
//!
//! On the web, assets are fetched over HTTP relative to the page origin.
//! Natively they are read from a directory on disk. Either way the result is
//! the raw file contents, decoded into images here.

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};

use crate::{
    atlas::{Atlas, SLOT_COUNT},
    config::ViewerConfig,
};

/// Outcome of loading the image for one atlas slot.
#[derive(Debug)]
pub enum AtlasEvent {
    Loaded { slot: usize, image: DynamicImage },
    Failed { slot: usize, error: anyhow::Error },
}

impl AtlasEvent {
    pub fn slot(&self) -> usize {
        match self {
            Self::Loaded { slot, .. } | Self::Failed { slot, .. } => *slot,
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(asset_root: &str, file_name: &str) -> Result<reqwest::Url> {
    let window = web_sys::window().context("no global window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!(
        "{}/{}/",
        origin,
        asset_root.trim_matches('/')
    ))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(asset_root: &str, file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(asset_root, file_name)?;
        let response = reqwest::get(url.clone())
            .await
            .with_context(|| format!("failed to fetch {url}"))?
            .error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(asset_root).join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    Ok(data)
}

/// Decode `bytes`, using the extension of `file_name` as a format hint when it has a known one.
pub fn decode_image(bytes: &[u8], file_name: &str) -> Result<DynamicImage> {
    let img = match ImageFormat::from_path(file_name) {
        Ok(format) => image::load_from_memory_with_format(bytes, format),
        Err(_) => image::load_from_memory(bytes),
    };
    img.with_context(|| format!("failed to decode {file_name}"))
}

pub async fn load_image(asset_root: &str, file_name: &str) -> Result<DynamicImage> {
    let bytes = load_binary(asset_root, file_name).await?;
    let img = decode_image(&bytes, file_name)?;
    log::info!(
        "Loaded {} ({}x{}, {} bytes)",
        file_name,
        img.width(),
        img.height(),
        bytes.len()
    );
    Ok(img)
}

async fn load_slot(asset_root: String, slot: usize, path: String) -> AtlasEvent {
    match load_image(&asset_root, &path).await {
        Ok(image) => AtlasEvent::Loaded { slot, image },
        Err(error) => AtlasEvent::Failed { slot, error },
    }
}

/// Apply a finished load to `atlas`. Failures are logged and leave the slot black.
pub fn apply_atlas_event(atlas: &mut Atlas, event: AtlasEvent) {
    match event {
        AtlasEvent::Loaded { slot, image } => {
            if let Err(e) = atlas.draw(slot, &image) {
                log::warn!("Could not composite image into slot {slot}: {e:#}");
            }
        }
        AtlasEvent::Failed { slot, error } => {
            log::warn!("Image for slot {slot} failed to load, leaving it blank: {error:#}");
        }
    }
}

/// Start one independent load per atlas slot. Every completion is posted to
/// the event loop through `proxy`, in whatever order the loads finish.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_atlas_loads<E>(
    config: &ViewerConfig,
    proxy: winit::event_loop::EventLoopProxy<E>,
    runtime: &tokio::runtime::Runtime,
) where
    E: From<AtlasEvent> + Send + 'static,
{
    for (slot, path) in (0..config.images.len()).filter_map(|i| Some((i, config.image_path(i)?))) {
        let proxy = proxy.clone();
        let asset_root = config.asset_root.clone();
        runtime.spawn(async move {
            let event = load_slot(asset_root, slot, path).await;
            if proxy.send_event(event.into()).is_err() {
                log::debug!("Event loop closed before slot {slot} finished loading");
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
pub fn spawn_atlas_loads<E>(config: &ViewerConfig, proxy: winit::event_loop::EventLoopProxy<E>)
where
    E: From<AtlasEvent> + 'static,
{
    for (slot, path) in (0..config.images.len()).filter_map(|i| Some((i, config.image_path(i)?))) {
        let proxy = proxy.clone();
        let asset_root = config.asset_root.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let event = load_slot(asset_root, slot, path).await;
            if proxy.send_event(event.into()).is_err() {
                log::debug!("Event loop closed before slot {slot} finished loading");
            }
        });
    }
}

/// Load every configured image concurrently and composite the results into a fresh atlas.
pub async fn load_atlas(config: &ViewerConfig) -> Atlas {
    let loads = (0..config.images.len())
        .filter_map(|i| Some((i, config.image_path(i)?)))
        .map(|(slot, path)| load_slot(config.asset_root.clone(), slot, path));
    let events = futures::future::join_all(loads).await;

    let mut atlas = Atlas::new(config.layout);
    for event in events {
        apply_atlas_event(&mut atlas, event);
    }
    log::info!("Atlas has {} of {} slots filled", atlas.filled(), SLOT_COUNT);
    atlas
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_with_and_without_extension_hint() {
        let bytes = png_bytes();
        assert_eq!(decode_image(&bytes, "a.png").unwrap().width(), 4);
        assert_eq!(decode_image(&bytes, "no_extension").unwrap().height(), 2);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_image(b"definitely not an image", "broken.jpg").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = load_image("does/not/exist", "akira.jpg").await.unwrap_err();
        assert!(format!("{err:#}").contains("akira.jpg"));
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = std::env::temp_dir().join(format!("atlas-cube-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tile.png"), png_bytes()).unwrap();
        let img = load_image(dir.to_str().unwrap(), "tile.png").await.unwrap();
        assert_eq!((img.width(), img.height()), (4, 2));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn failed_event_leaves_slot_blank() {
        let mut atlas = Atlas::default();
        apply_atlas_event(
            &mut atlas,
            AtlasEvent::Failed {
                slot: 2,
                error: anyhow::anyhow!("404"),
            },
        );
        assert!(!atlas.is_filled(2));
        assert_eq!(atlas.filled(), 0);
    }

    #[test]
    fn loaded_event_fills_slot() {
        let mut atlas = Atlas::default();
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));
        apply_atlas_event(&mut atlas, AtlasEvent::Loaded { slot: 4, image });
        assert!(atlas.is_filled(4));
        assert_eq!(atlas.image().get_pixel(10, 400), &Rgba([255, 0, 0, 255]));
    }

    #[tokio::test]
    async fn load_atlas_skips_missing_images() {
        let dir = std::env::temp_dir().join(format!("atlas-cube-partial-{}", std::process::id()));
        let images = dir.join("test_images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("fka.jpg.png"), png_bytes()).unwrap();

        let mut config = ViewerConfig {
            asset_root: dir.to_str().unwrap().to_string(),
            ..Default::default()
        };
        config.images[2] = "fka.jpg.png".to_string();

        let atlas = load_atlas(&config).await;
        assert_eq!(atlas.filled(), 1);
        assert!(atlas.is_filled(2));
        std::fs::remove_dir_all(dir).unwrap();
    }
}
