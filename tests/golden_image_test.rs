#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
const SIZE: u32 = 64;

#[cfg(feature = "integration-tests")]
fn full_atlas() -> atlas_cube::Atlas {
    let mut atlas = atlas_cube::Atlas::default();
    for slot in 0..atlas_cube::atlas::SLOT_COUNT {
        atlas.draw(slot, &common::test_utils::slot_image(slot)).unwrap();
    }
    atlas
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_show_the_plus_x_face_first() {
    use atlas_cube::{ViewerConfig, snapshot::render_snapshot};
    use common::test_utils::{SLOT_COLOURS, assert_close};

    let config = ViewerConfig::default();
    let image = render_snapshot(&config, full_atlas(), SIZE, SIZE).await.unwrap();

    // The camera starts on the +X axis, looking at the face fed by slot 1.
    assert_close(*image.get_pixel(SIZE / 2, SIZE / 2), SLOT_COLOURS[1], 2);
    // The cube does not reach the corners.
    assert_close(*image.get_pixel(0, 0), image::Rgba([0, 0, 0, 0]), 0);
    assert_close(*image.get_pixel(SIZE - 1, SIZE - 1), image::Rgba([0, 0, 0, 0]), 0);
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_render_an_empty_atlas_black() {
    use atlas_cube::{Atlas, ViewerConfig, snapshot::render_snapshot};
    use common::test_utils::assert_close;

    let config = ViewerConfig {
        clear_colour: wgpu::Color::WHITE,
        ..Default::default()
    };
    let image = render_snapshot(&config, Atlas::default(), SIZE, SIZE).await.unwrap();

    assert_close(*image.get_pixel(SIZE / 2, SIZE / 2), Atlas::BACKGROUND, 0);
    assert_close(*image.get_pixel(0, 0), image::Rgba([255, 255, 255, 255]), 0);
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_fill_the_corners_with_the_backdrop() {
    use atlas_cube::{ViewerConfig, snapshot::render_snapshot};
    use common::test_utils::{SLOT_COLOURS, assert_close};

    let config = ViewerConfig {
        backdrop: true,
        ..Default::default()
    };
    let image = render_snapshot(&config, full_atlas(), SIZE, SIZE).await.unwrap();

    // The backdrop maps the atlas over the whole target; its top-left is slot 0.
    assert_close(*image.get_pixel(0, 0), SLOT_COLOURS[0], 2);
    assert_close(*image.get_pixel(SIZE / 2, SIZE / 2), SLOT_COLOURS[1], 2);
}
