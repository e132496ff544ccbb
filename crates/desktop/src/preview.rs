use iced::widget::canvas;
use iced::widget::image::Handle;
use iced::widget::{container, image, stack, text};
use iced::{ContentFit, Element, Length, Point, Size};

use facescope_core::overlay::renderer::{layout, PixelRect};
use facescope_core::overlay::style::{Rgb, LABEL_SIZE, STROKE_WIDTH};
use facescope_core::shared::face::DetectedFace;
use facescope_core::shared::frame::Frame;

pub const PREVIEW_WIDTH: f32 = 640.0;
pub const PREVIEW_HEIGHT: f32 = 480.0;

/// Uploads a frame for display, mirrored for selfie-style preview.
///
/// This is the single horizontal flip in the pipeline; overlay anchors
/// are mirrored to match in [`OverlayCanvas`], never in the core
/// layout.
pub fn to_handle(frame: &Frame) -> Handle {
    let mirrored = frame.flip_horizontal();
    Handle::from_rgba(mirrored.width(), mirrored.height(), mirrored.to_rgba8())
}

/// The preview surface: live video under a transparent overlay canvas,
/// or a placeholder while the camera is off.
pub fn view<'a, Message: 'a>(
    handle: Option<&Handle>,
    faces: &[DetectedFace],
) -> Element<'a, Message> {
    let content: Element<'a, Message> = match handle {
        Some(handle) => {
            let video = image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Fill);
            let overlay = canvas(OverlayCanvas {
                faces: faces.to_vec(),
            })
            .width(Length::Fill)
            .height(Length::Fill);
            stack([video.into(), overlay.into()]).into()
        }
        None => container(text("Camera is off").size(20))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
    };

    container(content)
        .width(PREVIEW_WIDTH)
        .height(PREVIEW_HEIGHT)
        .into()
}

/// Draws one rectangle and one label per detection, re-laid-out from
/// the normalized list at the canvas's own pixel size on every frame.
struct OverlayCanvas {
    faces: Vec<DetectedFace>,
}

impl<Message> canvas::Program<Message> for OverlayCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: iced::Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let shapes = layout(&self.faces, bounds.width as f64, bounds.height as f64);
        for shape in &shapes {
            let x = mirror_x(&shape.rect, bounds.width as f64) as f32;
            let color = to_color(shape.style.color);

            frame.stroke(
                &canvas::Path::rectangle(
                    Point::new(x, shape.rect.y as f32),
                    Size::new(shape.rect.width as f32, shape.rect.height as f32),
                ),
                canvas::Stroke::default()
                    .with_width(STROKE_WIDTH)
                    .with_color(color),
            );

            frame.fill_text(canvas::Text {
                content: shape.style.label.to_string(),
                position: Point::new(x, shape.label_position.1 as f32),
                color,
                size: LABEL_SIZE.into(),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

/// The video pixels are flipped once at upload; box anchors flip here
/// to stay glued to the faces. Core layout stays in unflipped space.
fn mirror_x(rect: &PixelRect, surface_w: f64) -> f64 {
    surface_w - rect.x - rect.width
}

fn to_color(rgb: Rgb) -> iced::Color {
    iced::Color::from_rgb8(rgb.r, rgb.g, rgb.b)
}
