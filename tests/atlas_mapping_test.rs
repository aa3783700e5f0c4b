use atlas_cube::{
    atlas::{Atlas, AtlasLayout, SLOT_COUNT},
    data_structures::cube::{CubeGeometry, Face},
    resources::{AtlasEvent, apply_atlas_event},
};
use image::Rgba;

mod common;

use common::test_utils::{SLOT_COLOURS, slot_image};

/// Colour the atlas shows at a normalized UV coordinate.
fn sample(atlas: &Atlas, uv: [f32; 2]) -> Rgba<u8> {
    let size = atlas.layout().size() as f32;
    let x = (uv[0] * size).min(size - 1.0) as u32;
    let y = (uv[1] * size).min(size - 1.0) as u32;
    *atlas.image().get_pixel(x, y)
}

fn composite(order: &[usize]) -> Atlas {
    let mut atlas = Atlas::default();
    for &slot in order {
        apply_atlas_event(
            &mut atlas,
            AtlasEvent::Loaded {
                slot,
                image: slot_image(slot),
            },
        );
    }
    atlas
}

#[test]
fn every_face_samples_its_own_image() {
    let atlas = composite(&[0, 1, 2, 3, 4, 5]);
    let geometry = CubeGeometry::new(atlas.layout()).unwrap();

    for (face_idx, face) in Face::ALL.into_iter().enumerate() {
        let corners = &geometry.vertices[face_idx * 4..face_idx * 4 + 4];
        let centre = corners.iter().fold([0.0, 0.0], |acc, v| {
            [acc[0] + v.tex_coords[0] / 4.0, acc[1] + v.tex_coords[1] / 4.0]
        });
        assert_eq!(sample(&atlas, centre), SLOT_COLOURS[face.slot()], "{face:?}");

        // Just inside each corner as well, so no face bleeds into a neighbour.
        for v in corners {
            let inset = [
                v.tex_coords[0] + (centre[0] - v.tex_coords[0]) * 0.02,
                v.tex_coords[1] + (centre[1] - v.tex_coords[1]) * 0.02,
            ];
            assert_eq!(sample(&atlas, inset), SLOT_COLOURS[face.slot()], "{face:?}");
        }
    }
}

#[test]
fn arrival_order_does_not_change_the_atlas() {
    let in_order = composite(&[0, 1, 2, 3, 4, 5]);
    let shuffled = composite(&[4, 2, 5, 0, 3, 1]);
    assert!(in_order.is_complete());
    assert!(shuffled.is_complete());
    assert_eq!(in_order.image(), shuffled.image());
}

#[test]
fn failed_loads_leave_black_regions() {
    let mut atlas = composite(&[0, 1, 3, 4]);
    for slot in [2, 5] {
        apply_atlas_event(
            &mut atlas,
            AtlasEvent::Failed {
                slot,
                error: anyhow::anyhow!("connection reset"),
            },
        );
    }
    assert_eq!(atlas.filled(), SLOT_COUNT - 2);

    let layout = AtlasLayout::default();
    for slot in [2, 5] {
        let uv = layout.uv_rect(slot).unwrap();
        let centre = [(uv.u0 + uv.u1) / 2.0, (uv.v0 + uv.v1) / 2.0];
        assert_eq!(sample(&atlas, centre), Atlas::BACKGROUND);
    }
    let uv = layout.uv_rect(3).unwrap();
    assert_eq!(sample(&atlas, [(uv.u0 + uv.u1) / 2.0, uv.v0 + 0.01]), SLOT_COLOURS[3]);
}

#[test]
fn unused_atlas_area_stays_black() {
    let atlas = composite(&[0, 1, 2, 3, 4, 5]);
    // Right of the two cap tiles and below everything.
    assert_eq!(sample(&atlas, [0.75, 0.3]), Atlas::BACKGROUND);
    assert_eq!(sample(&atlas, [0.1, 0.95]), Atlas::BACKGROUND);
}

#[test]
fn late_image_replaces_earlier_one() {
    let mut atlas = composite(&[1]);
    apply_atlas_event(
        &mut atlas,
        AtlasEvent::Loaded {
            slot: 1,
            image: slot_image(4),
        },
    );
    let uv = atlas.layout().uv_rect(1).unwrap();
    let centre = [(uv.u0 + uv.u1) / 2.0, (uv.v0 + uv.v1) / 2.0];
    assert_eq!(sample(&atlas, centre), SLOT_COLOURS[4]);
}
