use crate::overlay::style::{style_for, OverlayStyle};
use crate::shared::face::{BoundingBox, DetectedFace};

/// Vertical headroom (px) a box needs before its label fits above it.
const LABEL_HEADROOM: f64 = 10.0;
/// Gap between the box top and a label drawn above it.
const LABEL_GAP_ABOVE: f64 = 5.0;
/// Gap between the box bottom and a label drawn below it.
const LABEL_GAP_BELOW: f64 = 15.0;

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Everything the drawing surface needs for one detection: the box,
/// its label, the label's anchor point, and the style.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayShape {
    pub rect: PixelRect,
    pub label_position: (f64, f64),
    pub style: OverlayStyle,
}

/// Scales a normalized box onto a surface of the given pixel size.
pub fn to_pixel_rect(bounding_box: &BoundingBox, surface_w: f64, surface_h: f64) -> PixelRect {
    PixelRect {
        x: bounding_box.x * surface_w,
        y: bounding_box.y * surface_h,
        width: bounding_box.width * surface_w,
        height: bounding_box.height * surface_h,
    }
}

/// Lays out one rectangle and one label per detection.
///
/// A full re-layout replaces the previous one on every change; nothing
/// is diffed. Coordinates are in the source frame's (unflipped) space —
/// a mirrored presentation applies its horizontal flip once at the
/// surface level, never here.
pub fn layout(faces: &[DetectedFace], surface_w: f64, surface_h: f64) -> Vec<OverlayShape> {
    faces
        .iter()
        .map(|face| {
            let rect = to_pixel_rect(&face.bounding_box, surface_w, surface_h);
            OverlayShape {
                rect,
                label_position: label_position(&rect),
                style: style_for(face.gender),
            }
        })
        .collect()
}

/// Above the box when there is headroom, otherwise under its bottom
/// edge so the label never leaves the surface at the top.
fn label_position(rect: &PixelRect) -> (f64, f64) {
    if rect.y > LABEL_HEADROOM {
        (rect.x, rect.y - LABEL_GAP_ABOVE)
    } else {
        (rect.x, rect.y + rect.height + LABEL_GAP_BELOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face::Gender;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn face(gender: Gender, x: f64, y: f64, w: f64, h: f64) -> DetectedFace {
        DetectedFace {
            gender,
            bounding_box: BoundingBox {
                x,
                y,
                width: w,
                height: h,
            },
        }
    }

    #[test]
    fn test_empty_list_draws_nothing() {
        assert!(layout(&[], 640.0, 480.0).is_empty());
    }

    #[test]
    fn test_one_shape_per_detection() {
        let faces = vec![
            face(Gender::Male, 0.1, 0.1, 0.2, 0.2),
            face(Gender::Female, 0.5, 0.5, 0.2, 0.2),
            face(Gender::Unknown, 0.7, 0.1, 0.1, 0.1),
        ];
        let shapes = layout(&faces, 640.0, 480.0);
        assert_eq!(shapes.len(), 3);
    }

    #[test]
    fn test_pixel_mapping_round_trip() {
        // The documented reference case: {0.1, 0.1, 0.2, 0.3} on 640x480.
        let faces = vec![face(Gender::Male, 0.1, 0.1, 0.2, 0.3)];
        let shapes = layout(&faces, 640.0, 480.0);

        let rect = shapes[0].rect;
        assert_relative_eq!(rect.x, 64.0);
        assert_relative_eq!(rect.y, 48.0);
        assert_relative_eq!(rect.width, 128.0);
        assert_relative_eq!(rect.height, 144.0);
    }

    #[test]
    fn test_layout_preserves_detection_order() {
        let faces = vec![
            face(Gender::Female, 0.5, 0.5, 0.1, 0.1),
            face(Gender::Male, 0.0, 0.0, 0.1, 0.1),
        ];
        let shapes = layout(&faces, 100.0, 100.0);
        assert_eq!(shapes[0].style.label, "Female");
        assert_eq!(shapes[1].style.label, "Male");
    }

    #[test]
    fn test_label_above_box_when_there_is_headroom() {
        let faces = vec![face(Gender::Male, 0.1, 0.5, 0.2, 0.2)];
        let shapes = layout(&faces, 100.0, 100.0);

        let (lx, ly) = shapes[0].label_position;
        assert_relative_eq!(lx, 10.0);
        assert_relative_eq!(ly, 45.0); // box top 50 - gap 5
    }

    #[test]
    fn test_label_below_box_near_top_edge() {
        // Box top at y = 5px, inside the 10px headroom.
        let faces = vec![face(Gender::Male, 0.1, 0.05, 0.2, 0.2)];
        let shapes = layout(&faces, 100.0, 100.0);

        let (_, ly) = shapes[0].label_position;
        assert_relative_eq!(ly, 40.0); // bottom 25 + gap 15
    }

    #[rstest]
    #[case::at_headroom(10.0 / 100.0)] // y == 10px is not strictly above
    #[case::at_top(0.0)]
    fn test_headroom_boundary_places_label_below(#[case] y: f64) {
        let faces = vec![face(Gender::Male, 0.0, y, 0.1, 0.1)];
        let shapes = layout(&faces, 100.0, 100.0);
        let (_, ly) = shapes[0].label_position;
        assert!(ly > shapes[0].rect.y + shapes[0].rect.height);
    }

    #[test]
    fn test_surface_size_drives_scaling() {
        let faces = vec![face(Gender::Male, 0.5, 0.5, 0.5, 0.5)];

        let small = layout(&faces, 100.0, 100.0);
        let large = layout(&faces, 1920.0, 1080.0);

        assert_relative_eq!(small[0].rect.width, 50.0);
        assert_relative_eq!(large[0].rect.width, 960.0);
        assert_relative_eq!(large[0].rect.y, 540.0);
    }
}
