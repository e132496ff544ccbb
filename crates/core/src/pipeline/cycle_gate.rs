/// Where the current detection cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Capturing,
    AwaitingResponse,
}

/// Non-blocking single-flight guard for the detection cycle.
///
/// Only `Idle` accepts a new tick; a tick that lands in any other state
/// is dropped, not queued. This is the whole throttling story: at most
/// one request is outstanding, ever.
#[derive(Debug)]
pub struct CycleGate {
    state: CycleState,
}

impl CycleGate {
    pub fn new() -> Self {
        Self {
            state: CycleState::Idle,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Accepts a tick. Returns `false` (and changes nothing) unless the
    /// gate is idle.
    pub fn try_begin(&mut self) -> bool {
        if self.state == CycleState::Idle {
            self.state = CycleState::Capturing;
            true
        } else {
            false
        }
    }

    /// The captured frame has been handed to the detector.
    pub fn dispatched(&mut self) {
        debug_assert_eq!(self.state, CycleState::Capturing);
        self.state = CycleState::AwaitingResponse;
    }

    /// The cycle was dropped before dispatch (no frame, encode failure).
    pub fn abandon(&mut self) {
        debug_assert_eq!(self.state, CycleState::Capturing);
        self.state = CycleState::Idle;
    }

    /// The outstanding request resolved, successfully or not. Always
    /// returns the gate to idle so the loop can never wedge.
    pub fn finish(&mut self) {
        self.state = CycleState::Idle;
    }
}

impl Default for CycleGate {
    fn default() -> Self {
        Self::new()
    }
}
