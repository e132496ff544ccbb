use crate::shared::face::Gender;

/// Box stroke width in surface pixels.
pub const STROKE_WIDTH: f32 = 4.0;

/// Label font size in surface pixels.
pub const LABEL_SIZE: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const MALE_COLOR: Rgb = Rgb { r: 0x4a, g: 0xde, b: 0x80 };
pub const FEMALE_COLOR: Rgb = Rgb { r: 0xf8, g: 0x71, b: 0x71 };
pub const UNKNOWN_COLOR: Rgb = Rgb { r: 0x9c, g: 0xa3, b: 0xaf };

/// Visual encoding of one detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    pub color: Rgb,
    pub label: &'static str,
}

/// Exhaustive per-gender style table. Every value gets its own entry
/// so "female" and "unknown" stay distinguishable on screen.
pub fn style_for(gender: Gender) -> OverlayStyle {
    match gender {
        Gender::Male => OverlayStyle {
            color: MALE_COLOR,
            label: "Male",
        },
        Gender::Female => OverlayStyle {
            color: FEMALE_COLOR,
            label: "Female",
        },
        Gender::Unknown => OverlayStyle {
            color: UNKNOWN_COLOR,
            label: "Unknown",
        },
    }
}
