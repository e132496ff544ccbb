use iced::color;
use iced::theme::Palette;
use iced::Theme;

/// Fixed dark palette; the preview is the whole point of the window,
/// so it sits on a near-black surround.
pub fn app_theme() -> Theme {
    Theme::custom("FaceScope", dark_palette())
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x11, 0x18, 0x27),
        text: color!(0xe5, 0xe7, 0xeb),
        primary: color!(0x4a, 0xde, 0x80),
        success: color!(0x4a, 0xde, 0x80),
        warning: color!(0xfa, 0xcc, 0x15),
        danger: color!(0xf8, 0x71, 0x71),
    }
}
