//! Viewer configuration.
//!
//! [`ViewerConfig::default`] reproduces the stock scene: six test images, a
//! 2048x2048 atlas and a camera four units away from the cube. Natively the
//! CLI overrides individual fields; the web build always uses the defaults.

use crate::atlas::{AtlasLayout, SLOT_COUNT};

/// Images composited into the atlas, in slot order.
pub const DEFAULT_IMAGES: [&str; SLOT_COUNT] = [
    "akira.jpg",
    "bowie.jpg",
    "fka.jpg",
    "exmachina.jpeg",
    "yyy.jpg",
    "uncut.jpg",
];

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Id of the `<canvas>` element the web build renders into.
    pub canvas_id: String,
    /// Asset root: a directory natively, a path below the page origin on the web.
    pub asset_root: String,
    /// Directory under the asset root holding the images.
    pub image_dir: String,
    pub images: [String; SLOT_COUNT],
    pub layout: AtlasLayout,
    pub camera_distance: f32,
    pub clear_colour: wgpu::Color,
    /// Draw the raw atlas behind the cube.
    pub backdrop: bool,
    /// Initial window size for native builds.
    pub window_size: (u32, u32),
}

impl ViewerConfig {
    /// Path of the image for slot `index`, relative to the asset root.
    pub fn image_path(&self, index: usize) -> Option<String> {
        self.images
            .get(index)
            .map(|name| format!("{}/{}", self.image_dir.trim_end_matches('/'), name))
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            canvas_id: "render".to_string(),
            asset_root: "assets".to_string(),
            image_dir: "test_images".to_string(),
            images: DEFAULT_IMAGES.map(String::from),
            layout: AtlasLayout::default(),
            camera_distance: 4.0,
            clear_colour: wgpu::Color::TRANSPARENT,
            backdrop: false,
            window_size: (1280, 720),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_paths_follow_slot_order() {
        let config = ViewerConfig::default();
        assert_eq!(config.image_path(0).as_deref(), Some("test_images/akira.jpg"));
        assert_eq!(config.image_path(3).as_deref(), Some("test_images/exmachina.jpeg"));
        assert_eq!(config.image_path(SLOT_COUNT), None);
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let config = ViewerConfig {
            image_dir: "pics/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.image_path(5).as_deref(), Some("pics/uncut.jpg"));
    }
}
