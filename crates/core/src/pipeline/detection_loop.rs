use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender};

use crate::capture::domain::frame_source::FrameSource;
use crate::capture::infrastructure::jpeg_encoder;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::pipeline::cycle_gate::CycleGate;
use crate::shared::constants::{
    DETECTION_ERROR_MESSAGE, DETECT_PERIOD, JPEG_QUALITY, PREVIEW_PERIOD,
};
use crate::shared::encoded_frame::EncodedFrame;
use crate::shared::face::DetectedFace;
use crate::shared::frame::Frame;

/// How long the loop may sleep before re-checking its stop flag.
const STOP_POLL: Duration = Duration::from_millis(50);

pub struct LoopConfig {
    /// Fixed delay between detection cycles.
    pub detect_period: Duration,
    /// Cadence for raw preview frames; `None` disables preview
    /// publishing (headless runs).
    pub preview_period: Option<Duration>,
    /// JPEG quality for frames sent to the service.
    pub jpeg_quality: u8,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            detect_period: DETECT_PERIOD,
            preview_period: Some(PREVIEW_PERIOD),
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

/// What the loop publishes to its owner.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    /// A raw frame for display; never triggers detection by itself.
    Preview(Frame),
    /// A frame was dispatched to the detector (loading = on).
    CycleStarted,
    /// The cycle resolved with a fresh detection list (loading = off).
    Detections(Vec<DetectedFace>),
    /// The cycle failed; carries the generic user-facing message
    /// (loading = off). The loop keeps ticking.
    Error(String),
    /// The loop exited and the capture device was released.
    Stopped,
}

struct DetectJob {
    generation: u64,
    image: EncodedFrame,
}

struct DetectOutcome {
    generation: u64,
    result: Result<Vec<DetectedFace>, DetectionError>,
}

/// Owner's handle to a running loop.
///
/// `stop` is idempotent and safe from teardown; dropping the handle
/// stops the loop. Stopping joins the loop thread (bounded by
/// `STOP_POLL`) but never waits for an in-flight remote call — a late
/// response is discarded.
pub struct LoopHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LoopHandle {
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct DetectionLoop;

impl DetectionLoop {
    /// Starts the capture-and-annotate loop on a worker thread.
    ///
    /// The loop takes exclusive ownership of the source for its Running
    /// lifetime and releases it exactly once on stop. The caller holds
    /// at most one live handle; starting is therefore never re-entrant.
    pub fn spawn(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        config: LoopConfig,
    ) -> (Receiver<LoopEvent>, LoopHandle) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_worker = stop.clone();
        let thread = thread::spawn(move || run_loop(source, detector, config, tx, &stop_worker));
        (
            rx,
            LoopHandle {
                stop,
                thread: Some(thread),
            },
        )
    }
}

fn run_loop(
    mut source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    config: LoopConfig,
    events: Sender<LoopEvent>,
    stop: &AtomicBool,
) {
    let (job_tx, job_rx) = crossbeam_channel::bounded::<DetectJob>(1);
    let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded::<DetectOutcome>();
    spawn_detector(detector, job_rx, outcome_tx);

    let preview_tick = match config.preview_period {
        Some(period) => crossbeam_channel::tick(period),
        None => crossbeam_channel::never(),
    };
    let detect_tick = crossbeam_channel::tick(config.detect_period);

    let mut gate = CycleGate::new();
    let mut generation: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        select! {
            recv(preview_tick) -> _ => {
                match source.grab() {
                    Ok(Some(frame)) => {
                        let _ = events.send(LoopEvent::Preview(frame));
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("preview frame unavailable: {e}"),
                }
            }
            recv(detect_tick) -> _ => {
                run_cycle(
                    source.as_mut(),
                    &mut gate,
                    &mut generation,
                    &job_tx,
                    &events,
                    config.jpeg_quality,
                );
            }
            recv(outcome_rx) -> msg => {
                if let Ok(outcome) = msg {
                    apply_outcome(outcome, &mut gate, generation, &events, stop);
                    // Ticks that fired while the request was in flight
                    // are dropped, not queued; the next cycle waits for
                    // a fresh tick.
                    while detect_tick.try_recv().is_ok() {}
                }
            }
            default(STOP_POLL) => {}
        }
    }

    // The detector thread drains and exits once the job channel closes;
    // an in-flight request is left to resolve into a dead channel.
    drop(job_tx);
    source.close();
    let _ = events.send(LoopEvent::Stopped);
}

/// One detection tick. Busy gate, missing frame, or encode failure all
/// drop the tick; only a dispatched frame announces a cycle.
fn run_cycle(
    source: &mut dyn FrameSource,
    gate: &mut CycleGate,
    generation: &mut u64,
    jobs: &Sender<DetectJob>,
    events: &Sender<LoopEvent>,
    quality: u8,
) {
    if !gate.try_begin() {
        log::debug!("detection still in flight, dropping tick");
        return;
    }

    let frame = match source.grab() {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            gate.abandon();
            return;
        }
        Err(e) => {
            log::warn!("frame capture failed: {e}");
            gate.abandon();
            return;
        }
    };

    let image = match jpeg_encoder::encode_base64(&frame, quality) {
        Ok(image) => image,
        Err(e) => {
            log::warn!("frame encoding failed: {e}");
            gate.abandon();
            return;
        }
    };

    *generation += 1;
    if jobs
        .send(DetectJob {
            generation: *generation,
            image,
        })
        .is_err()
    {
        gate.abandon();
        return;
    }
    gate.dispatched();
    let _ = events.send(LoopEvent::CycleStarted);
}

/// Applies a detector outcome. The gate is cleared before anything
/// else, whatever the outcome, so a failure can never wedge the loop.
fn apply_outcome(
    outcome: DetectOutcome,
    gate: &mut CycleGate,
    generation: u64,
    events: &Sender<LoopEvent>,
    stop: &AtomicBool,
) {
    gate.finish();

    if outcome.generation != generation || stop.load(Ordering::Relaxed) {
        log::debug!("discarding stale result from cycle {}", outcome.generation);
        return;
    }

    match outcome.result {
        Ok(faces) => {
            log::debug!("cycle {} detected {} face(s)", outcome.generation, faces.len());
            let _ = events.send(LoopEvent::Detections(faces));
        }
        Err(e) => {
            log::error!("cycle {} failed: {e}", outcome.generation);
            let _ = events.send(LoopEvent::Error(DETECTION_ERROR_MESSAGE.to_string()));
        }
    }
}

/// Detector thread: one job at a time, detached. It dies with the job
/// channel; a response that arrives after stop has nowhere to go.
fn spawn_detector(
    mut detector: Box<dyn FaceDetector>,
    jobs: Receiver<DetectJob>,
    outcomes: Sender<DetectOutcome>,
) {
    thread::spawn(move || {
        for job in jobs.iter() {
            let result = detector.detect(&job.image);
            let outcome = DetectOutcome {
                generation: job.generation,
                result,
            };
            if outcomes.send(outcome).is_err() {
                log::debug!("detection result arrived after stop, discarding");
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::frame_source::CaptureError;
    use crate::shared::face::{BoundingBox, Gender};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Instant;

    // --- Stubs ---

    struct StubSource {
        frame: Option<Frame>,
        grabs: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
    }

    impl StubSource {
        fn new(frame: Option<Frame>) -> (Self, Arc<AtomicUsize>, Arc<AtomicBool>) {
            let grabs = Arc::new(AtomicUsize::new(0));
            let closed = Arc::new(AtomicBool::new(false));
            (
                Self {
                    frame,
                    grabs: grabs.clone(),
                    closed: closed.clone(),
                },
                grabs,
                closed,
            )
        }
    }

    impl FrameSource for StubSource {
        fn grab(&mut self) -> Result<Option<Frame>, CaptureError> {
            self.grabs.fetch_add(1, Ordering::Relaxed);
            Ok(self.frame.clone())
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::Relaxed);
        }
    }

    type DetectFn = dyn FnMut() -> Result<Vec<DetectedFace>, DetectionError> + Send;

    struct StubDetector {
        behavior: Box<DetectFn>,
        calls: Arc<AtomicUsize>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl StubDetector {
        fn new(
            behavior: impl FnMut() -> Result<Vec<DetectedFace>, DetectionError> + Send + 'static,
        ) -> Self {
            Self {
                behavior: Box::new(behavior),
                calls: Arc::new(AtomicUsize::new(0)),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _image: &EncodedFrame) -> Result<Vec<DetectedFace>, DetectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            let result = (self.behavior)();
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    // --- Helpers ---

    fn test_frame() -> Frame {
        Frame::new(vec![128; 8 * 8 * 3], 8, 8, 3)
    }

    fn one_face() -> Vec<DetectedFace> {
        vec![DetectedFace {
            gender: Gender::Male,
            bounding_box: BoundingBox {
                x: 0.1,
                y: 0.1,
                width: 0.2,
                height: 0.3,
            },
        }]
    }

    fn fast_config() -> LoopConfig {
        LoopConfig {
            detect_period: Duration::from_millis(30),
            preview_period: None,
            jpeg_quality: 50,
        }
    }

    fn wait_for<F: Fn(&LoopEvent) -> bool>(
        rx: &Receiver<LoopEvent>,
        timeout: Duration,
        pred: F,
    ) -> Option<LoopEvent> {
        let deadline = Instant::now() + timeout;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match rx.recv_timeout(remaining) {
                Ok(event) if pred(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => break,
            }
        }
        None
    }

    // --- Tests ---

    #[test]
    fn test_publishes_detections() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let detector = StubDetector::new(|| Ok(one_face()));

        let (rx, mut handle) =
            DetectionLoop::spawn(Box::new(source), Box::new(detector), fast_config());

        let event = wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::Detections(_))
        });
        handle.stop();

        match event {
            Some(LoopEvent::Detections(faces)) => assert_eq!(faces, one_face()),
            other => panic!("expected detections, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_started_precedes_detections() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let detector = StubDetector::new(|| Ok(vec![]));

        let (rx, mut handle) =
            DetectionLoop::spawn(Box::new(source), Box::new(detector), fast_config());

        let first = wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::CycleStarted | LoopEvent::Detections(_))
        });
        handle.stop();

        assert!(matches!(first, Some(LoopEvent::CycleStarted)));
    }

    #[test]
    fn test_error_is_generic_and_loop_keeps_ticking() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let detector =
            StubDetector::new(|| Err(DetectionError::Request("boom".into())));

        let (rx, mut handle) =
            DetectionLoop::spawn(Box::new(source), Box::new(detector), fast_config());

        // Two consecutive failures prove the loop did not wedge.
        let first = wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::Error(_))
        });
        let second = wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::Error(_))
        });
        handle.stop();

        match first {
            Some(LoopEvent::Error(msg)) => {
                assert_eq!(msg, DETECTION_ERROR_MESSAGE);
                assert!(!msg.contains("boom"));
            }
            other => panic!("expected an error event, got {other:?}"),
        }
        assert!(second.is_some());
    }

    #[test]
    fn test_single_flight_under_slow_detector() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let detector =
            StubDetector::new(|| Ok(vec![])).with_delay(Duration::from_millis(100));
        let calls = detector.calls.clone();
        let max_in_flight = detector.max_in_flight.clone();

        let (rx, mut handle) = DetectionLoop::spawn(
            Box::new(source),
            Box::new(detector),
            LoopConfig {
                detect_period: Duration::from_millis(20),
                ..fast_config()
            },
        );

        // Let several detect periods elapse while each request takes
        // five of them.
        wait_for(&rx, Duration::from_millis(450), |_| false);
        handle.stop();

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        let calls = calls.load(Ordering::SeqCst);
        assert!(calls >= 2, "expected repeated cycles, got {calls}");
        // 450ms / 20ms = 22 ticks; single-flight must have dropped most.
        assert!(calls <= 6, "ticks were queued instead of dropped: {calls}");
    }

    #[test]
    fn test_source_without_frame_is_silent_noop() {
        let (source, grabs, _) = StubSource::new(None);
        let detector = StubDetector::new(|| Ok(vec![]));
        let calls = detector.calls.clone();

        let (rx, mut handle) =
            DetectionLoop::spawn(Box::new(source), Box::new(detector), fast_config());

        let event = wait_for(&rx, Duration::from_millis(200), |e| {
            matches!(e, LoopEvent::CycleStarted | LoopEvent::Error(_))
        });
        handle.stop();

        assert!(event.is_none(), "abandoned cycles must stay silent");
        assert!(grabs.load(Ordering::Relaxed) > 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_releases_source_and_emits_stopped() {
        let (source, _, closed) = StubSource::new(Some(test_frame()));
        let detector = StubDetector::new(|| Ok(vec![]));

        let (rx, mut handle) =
            DetectionLoop::spawn(Box::new(source), Box::new(detector), fast_config());

        wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::Detections(_))
        });
        handle.stop();

        assert!(closed.load(Ordering::Relaxed));
        let stopped = wait_for(&rx, Duration::from_secs(1), |e| {
            matches!(e, LoopEvent::Stopped)
        });
        assert!(stopped.is_some());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let detector = StubDetector::new(|| Ok(vec![]));

        let (_rx, mut handle) =
            DetectionLoop::spawn(Box::new(source), Box::new(detector), fast_config());

        handle.stop();
        handle.stop();
        assert!(!handle.is_running());
    }

    #[test]
    fn test_no_sampling_after_stop() {
        let (source, grabs, _) = StubSource::new(Some(test_frame()));
        let detector = StubDetector::new(|| Ok(vec![]));

        let (rx, mut handle) =
            DetectionLoop::spawn(Box::new(source), Box::new(detector), fast_config());
        wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::Detections(_))
        });
        handle.stop();

        let after_stop = grabs.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(150));
        assert_eq!(grabs.load(Ordering::Relaxed), after_stop);
    }

    #[test]
    fn test_late_response_after_stop_is_discarded() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let detector =
            StubDetector::new(|| Ok(one_face())).with_delay(Duration::from_millis(300));

        let (rx, mut handle) = DetectionLoop::spawn(
            Box::new(source),
            Box::new(detector),
            LoopConfig {
                detect_period: Duration::from_millis(20),
                ..fast_config()
            },
        );

        // Stop while the first request is still in flight.
        wait_for(&rx, Duration::from_millis(100), |e| {
            matches!(e, LoopEvent::CycleStarted)
        });
        handle.stop();

        // Drain everything the loop ever sent; the late result must not
        // appear.
        let mut saw_detections = false;
        while let Ok(event) = rx.recv_timeout(Duration::from_millis(500)) {
            if matches!(event, LoopEvent::Detections(_)) {
                saw_detections = true;
            }
        }
        assert!(!saw_detections, "late response leaked past stop");
    }

    #[test]
    fn test_preview_frames_flow_when_enabled() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let detector = StubDetector::new(|| Ok(vec![]));

        let (rx, mut handle) = DetectionLoop::spawn(
            Box::new(source),
            Box::new(detector),
            LoopConfig {
                detect_period: Duration::from_secs(60),
                preview_period: Some(Duration::from_millis(10)),
                jpeg_quality: 50,
            },
        );

        let preview = wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::Preview(_))
        });
        handle.stop();

        match preview {
            Some(LoopEvent::Preview(frame)) => assert_eq!(frame.width(), 8),
            other => panic!("expected a preview frame, got {other:?}"),
        }
    }

    #[test]
    fn test_no_preview_when_disabled() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let detector = StubDetector::new(|| Ok(vec![]));

        let (rx, mut handle) = DetectionLoop::spawn(
            Box::new(source),
            Box::new(detector),
            LoopConfig {
                detect_period: Duration::from_secs(60),
                preview_period: None,
                jpeg_quality: 50,
            },
        );

        let preview = wait_for(&rx, Duration::from_millis(150), |e| {
            matches!(e, LoopEvent::Preview(_))
        });
        handle.stop();
        assert!(preview.is_none());
    }

    #[test]
    fn test_replaces_previous_detections_wholesale() {
        let (source, _, _) = StubSource::new(Some(test_frame()));
        let flip = Arc::new(Mutex::new(false));
        let flip_in_stub = flip.clone();
        let detector = StubDetector::new(move || {
            let mut first = flip_in_stub.lock().unwrap();
            if !*first {
                *first = true;
                Ok(one_face())
            } else {
                Ok(vec![])
            }
        });

        let (rx, mut handle) =
            DetectionLoop::spawn(Box::new(source), Box::new(detector), fast_config());

        let first = wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::Detections(_))
        });
        let second = wait_for(&rx, Duration::from_secs(2), |e| {
            matches!(e, LoopEvent::Detections(_))
        });
        handle.stop();

        match (first, second) {
            (Some(LoopEvent::Detections(a)), Some(LoopEvent::Detections(b))) => {
                assert_eq!(a.len(), 1);
                assert!(b.is_empty(), "each cycle must replace, not merge");
            }
            other => panic!("expected two detection events, got {other:?}"),
        }
    }
}
