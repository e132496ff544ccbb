use std::time::Duration;

use crossbeam_channel::Receiver;
use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, text, Space};
use iced::{Element, Length, Subscription, Task, Theme};

use facescope_core::pipeline::detection_loop::{LoopEvent, LoopHandle};
use facescope_core::shared::face::DetectedFace;

use crate::preview;
use crate::settings::Settings;
use crate::theme;
use crate::workers::detect_worker;

/// How often queued loop events are drained into the UI state.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub enum Message {
    ToggleDetection,
    Poll,
}

pub struct App {
    settings: Settings,
    is_loading: bool,
    error: Option<String>,
    detections: Vec<DetectedFace>,
    preview: Option<Handle>,
    /// Present exactly while the loop is Running; holding at most one
    /// handle is what makes "start while running" impossible.
    worker: Option<(Receiver<LoopEvent>, LoopHandle)>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        (
            Self {
                settings: Settings::load(),
                is_loading: false,
                error: None,
                detections: Vec::new(),
                preview: None,
                worker: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ToggleDetection => {
                if self.is_detecting() {
                    self.stop_detection();
                } else {
                    self.start_detection();
                }
            }
            Message::Poll => {
                let events: Vec<LoopEvent> = self
                    .worker
                    .as_ref()
                    .map(|(rx, _)| rx.try_iter().collect())
                    .unwrap_or_default();
                for event in events {
                    self.apply_event(event);
                }
            }
        }
        Task::none()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.worker.is_some() {
            iced::time::every(POLL_INTERVAL).map(|_| Message::Poll)
        } else {
            Subscription::none()
        }
    }

    pub fn theme(&self) -> Theme {
        theme::app_theme()
    }

    fn is_detecting(&self) -> bool {
        self.worker.is_some()
    }

    fn start_detection(&mut self) {
        self.error = None;
        self.detections.clear();

        match detect_worker::spawn(&self.settings) {
            Ok((rx, handle)) => {
                self.worker = Some((rx, handle));
                self.settings.save();
            }
            Err(e) => {
                self.error = Some(e.user_message().to_string());
            }
        }
    }

    /// Safe to call any number of times; a stopped app stays stopped.
    fn stop_detection(&mut self) {
        if let Some((_rx, mut handle)) = self.worker.take() {
            handle.stop();
        }
        self.is_loading = false;
        self.error = None;
        self.detections.clear();
        self.preview = None;
    }

    fn apply_event(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::Preview(frame) => {
                self.preview = Some(preview::to_handle(&frame));
            }
            LoopEvent::CycleStarted => {
                self.is_loading = true;
            }
            LoopEvent::Detections(faces) => {
                self.detections = faces;
                self.is_loading = false;
                self.error = None;
            }
            LoopEvent::Error(message) => {
                self.error = Some(message);
                self.is_loading = false;
            }
            LoopEvent::Stopped => {}
        }
    }

    fn status_message(&self) -> String {
        if let Some(error) = &self.error {
            return format!("Error: {error}");
        }
        if !self.is_detecting() {
            return "Press Start to open the camera and detect faces".to_string();
        }
        if self.is_loading {
            return "Processing\u{2026}".to_string();
        }
        format!("{} face(s) detected", self.detections.len())
    }

    pub fn view(&self) -> Element<'_, Message> {
        let header = column![
            text("FaceScope").size(28),
            text("Face detection powered by the Gemini API").size(14),
        ]
        .spacing(4);

        let surface = preview::view(self.preview.as_ref(), &self.detections);

        let label = if self.is_detecting() { "Stop" } else { "Start" };
        // Mid-cycle the toggle locks out, unless an error is already
        // on screen and the user wants out.
        let on_press = if self.is_loading && self.error.is_none() {
            None
        } else {
            Some(Message::ToggleDetection)
        };
        let toggle = button(text(label).size(16)).on_press_maybe(on_press).padding([10, 28]);

        let footer = row![
            text(self.status_message()).size(14),
            Space::new().width(Length::Fill),
            toggle,
        ]
        .width(preview::PREVIEW_WIDTH)
        .align_y(iced::Alignment::Center);

        container(
            column![header, surface, footer]
                .spacing(16)
                .align_x(iced::Alignment::Center),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .padding(24)
        .into()
    }
}
