//! Texture atlas layout and compositing.
//!
//! Six source images share one square atlas. The first four ("side" tiles) sit
//! next to each other along the top row; the remaining two ("cap" tiles) are
//! square and sit directly beneath them:
//!
//! ```text
//! +-------+-------+-------+-------+
//! |   0   |   1   |   2   |   3   |  tile_height
//! +-------+-------+-------+-------+
//! |   4   |   5   |                  tile_width
//! |       |       |
//! +-------+-------+
//! ```
//!
//! Every image is stretched to fill its slot. UV `(0, 0)` is the atlas' top-left
//! texel.

use anyhow::{Result, bail, ensure};
use image::{DynamicImage, Rgba, RgbaImage, imageops};

/// Number of images packed into the atlas, one per cube face.
pub const SLOT_COUNT: usize = 6;
/// Slots `0..SIDE_SLOTS` are side tiles, the rest are square cap tiles.
pub const SIDE_SLOTS: usize = 4;

/// Pixel rectangle of one slot inside the atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasSlot {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Normalized texture coordinates of a slot, `(u0, v0)` top-left and `(u1, v1)` bottom-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    pub fn contains(&self, uv: [f32; 2]) -> bool {
        (self.u0..=self.u1).contains(&uv[0]) && (self.v0..=self.v1).contains(&uv[1])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    size: u32,
    tile_width: u32,
    tile_height: u32,
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self {
            size: 2048,
            tile_width: 512,
            tile_height: 384,
        }
    }
}

impl AtlasLayout {
    /// Create a layout for a `size`×`size` atlas.
    ///
    /// Fails if any tile dimension is zero or the six slots would not fit.
    pub fn new(size: u32, tile_width: u32, tile_height: u32) -> Result<Self> {
        ensure!(
            size > 0 && tile_width > 0 && tile_height > 0,
            "atlas and tile dimensions must be non-zero (size {size}, tile {tile_width}x{tile_height})"
        );
        let row_width = tile_width as u64 * SIDE_SLOTS as u64;
        let column_height = tile_height as u64 + tile_width as u64;
        ensure!(
            row_width <= size as u64 && column_height <= size as u64,
            "tiles of {tile_width}x{tile_height} do not fit into a {size}x{size} atlas"
        );
        Ok(Self {
            size,
            tile_width,
            tile_height,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Pixel rectangle of slot `index`.
    pub fn slot(&self, index: usize) -> Result<AtlasSlot> {
        let tw = self.tile_width;
        let th = self.tile_height;
        match index {
            i if i < SIDE_SLOTS => Ok(AtlasSlot {
                x: i as u32 * tw,
                y: 0,
                width: tw,
                height: th,
            }),
            i if i < SLOT_COUNT => Ok(AtlasSlot {
                x: (i - SIDE_SLOTS) as u32 * tw,
                y: th,
                width: tw,
                height: tw,
            }),
            i => bail!("atlas slot {i} out of range, the atlas has {SLOT_COUNT} slots"),
        }
    }

    /// Normalized UV rectangle of slot `index`.
    pub fn uv_rect(&self, index: usize) -> Result<UvRect> {
        let slot = self.slot(index)?;
        let size = self.size as f32;
        Ok(UvRect {
            u0: slot.x as f32 / size,
            v0: slot.y as f32 / size,
            u1: (slot.x + slot.width) as f32 / size,
            v1: (slot.y + slot.height) as f32 / size,
        })
    }

    /// All slot rectangles in slot order.
    pub fn slots(&self) -> impl Iterator<Item = AtlasSlot> + '_ {
        (0..SLOT_COUNT).filter_map(|i| self.slot(i).ok())
    }
}

/// CPU-side atlas image that source images are composited into as they arrive.
///
/// Images may be drawn in any order. The atlas remembers which slots hold an
/// image and whether anything changed since the last [`take_dirty`](Self::take_dirty),
/// so the GPU copy can be refreshed after every late arrival.
#[derive(Debug)]
pub struct Atlas {
    layout: AtlasLayout,
    image: RgbaImage,
    filled: [bool; SLOT_COUNT],
    dirty: bool,
}

impl Atlas {
    /// Opaque black background, matching an empty slot.
    pub const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

    pub fn new(layout: AtlasLayout) -> Self {
        let image = RgbaImage::from_pixel(layout.size(), layout.size(), Self::BACKGROUND);
        Self {
            layout,
            image,
            filled: [false; SLOT_COUNT],
            // The blank atlas still has to reach the GPU once.
            dirty: true,
        }
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Stretch `source` over slot `index`, replacing whatever was there.
    ///
    /// The slot is cleared to [`Self::BACKGROUND`] and the image is blended on
    /// top of it, so translucent sources still leave every texel opaque.
    pub fn draw(&mut self, index: usize, source: &DynamicImage) -> Result<()> {
        let slot = self.layout.slot(index)?;
        let scaled = imageops::resize(
            &source.to_rgba8(),
            slot.width,
            slot.height,
            imageops::FilterType::Triangle,
        );
        let (x, y) = (slot.x as i64, slot.y as i64);
        let cleared = RgbaImage::from_pixel(slot.width, slot.height, Self::BACKGROUND);
        imageops::replace(&mut self.image, &cleared, x, y);
        imageops::overlay(&mut self.image, &scaled, x, y);
        self.filled[index] = true;
        self.dirty = true;
        log::debug!(
            "Composited {}x{} image into atlas slot {} at ({}, {})",
            source.width(),
            source.height(),
            index,
            slot.x,
            slot.y
        );
        Ok(())
    }

    /// Number of slots that received an image.
    pub fn filled(&self) -> usize {
        self.filled.iter().filter(|f| **f).count()
    }

    pub fn is_filled(&self, index: usize) -> bool {
        self.filled.get(index).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == SLOT_COUNT
    }

    /// Returns whether the atlas changed since the last call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl Default for Atlas {
    fn default() -> Self {
        Self::new(AtlasLayout::default())
    }
}
