use atlas_cube::atlas::SLOT_COUNT;
use image::{DynamicImage, Rgba, RgbaImage};

/// One clearly distinct colour per atlas slot.
pub(crate) const SLOT_COLOURS: [Rgba<u8>; SLOT_COUNT] = [
    Rgba([255, 0, 0, 255]),
    Rgba([0, 255, 0, 255]),
    Rgba([0, 0, 255, 255]),
    Rgba([255, 255, 0, 255]),
    Rgba([0, 255, 255, 255]),
    Rgba([255, 0, 255, 255]),
];

pub(crate) fn solid(colour: Rgba<u8>, width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, colour))
}

/// Source image for `slot`, deliberately not the slot's own size.
#[allow(dead_code)]
pub(crate) fn slot_image(slot: usize) -> DynamicImage {
    solid(SLOT_COLOURS[slot], 37 + slot as u32, 23)
}

#[allow(dead_code)]
pub(crate) fn assert_close(actual: Rgba<u8>, expected: Rgba<u8>, tolerance: u8) {
    let close = actual
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, e)| a.abs_diff(*e) <= tolerance);
    assert!(close, "expected {expected:?} (±{tolerance}), got {actual:?}");
}
