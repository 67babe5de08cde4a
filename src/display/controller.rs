//! Start/stop state machine driving the live camera label.

use std::fmt;
use std::time::{Duration, Instant};

use crate::camera::{convert_format, CaptureError, CaptureSession, Resolution};

use super::sink::PresentationSink;
use super::ticker::{Ticker, DEFAULT_TICK_HZ};

/// Whether the display loop is pulling frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Stopped,
    Running,
}

impl SessionState {
    /// Caption for the toggle button in this state.
    pub fn toggle_label(self) -> &'static str {
        match self {
            SessionState::Stopped => "Start Camera",
            SessionState::Running => "Stop Camera",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Stopped => write!(f, "stopped"),
            SessionState::Running => write!(f, "running"),
        }
    }
}

/// Startup options for the display loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOptions {
    /// Camera device index
    pub device_index: u32,
    /// Preferred capture resolution
    pub resolution: Resolution,
    /// Display ticks per second
    pub tick_hz: u32,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Resolution::LOW,
            tick_hz: DEFAULT_TICK_HZ,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Loop is stopped; the session was not touched.
    Idle,
    /// A frame was forwarded to the sink.
    Forwarded,
    /// The session had no new frame.
    Missed,
}

/// Counters for the current (or last) running period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub forwarded: u64,
    pub missed: u64,
}

/// Drives a capture session from toggle and tick events.
///
/// The controller owns the session exclusively. All entry points take
/// `&mut self`, so toggles and ticks are serialized by construction.
/// Invariant: the session is open iff the state is `Running`.
pub struct DisplayController<S: CaptureSession> {
    session: S,
    options: LoopOptions,
    state: SessionState,
    ticker: Ticker,
    stats: LoopStats,
}

impl<S: CaptureSession> DisplayController<S> {
    pub fn new(session: S, options: LoopOptions) -> Self {
        let ticker = Ticker::from_hz(options.tick_hz);
        Self {
            session,
            options,
            state: SessionState::Stopped,
            ticker,
            stats: LoopStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &LoopOptions {
        &self.options
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn tick_interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Flip between `Stopped` and `Running`.
    ///
    /// Starting opens the session and arms the ticker; on failure the
    /// error is shown on the sink, returned, and the state stays
    /// `Stopped`. Stopping disarms the ticker before closing the session.
    pub fn on_toggle<P: PresentationSink>(
        &mut self,
        sink: &mut P,
        now: Instant,
    ) -> Result<SessionState, CaptureError> {
        match self.state {
            SessionState::Stopped => self.start(sink, now)?,
            SessionState::Running => self.stop(sink),
        }
        Ok(self.state)
    }

    fn start<P: PresentationSink>(&mut self, sink: &mut P, now: Instant) -> Result<(), CaptureError> {
        self.session.configure(self.options.resolution);
        if let Err(e) = self.session.open(self.options.device_index) {
            log::warn!("Could not start camera: {}", e);
            sink.show_error(&e);
            return Err(e);
        }

        self.stats = LoopStats::default();
        self.state = SessionState::Running;
        self.ticker.start(now);
        sink.capture_state_changed(self.state);
        log::info!(
            "Camera {} started, refreshing every {:?}",
            self.options.device_index,
            self.ticker.interval()
        );
        Ok(())
    }

    fn stop<P: PresentationSink>(&mut self, sink: &mut P) {
        self.halt();
        sink.capture_state_changed(self.state);
    }

    /// Stop ticking, then release the device.
    fn halt(&mut self) {
        self.ticker.stop();
        self.state = SessionState::Stopped;
        self.session.close();
        log::debug!(
            "Display loop stopped after {} ticks ({} frames, {} misses)",
            self.stats.ticks,
            self.stats.forwarded,
            self.stats.missed
        );
    }

    /// Pull one frame and forward it if there is one.
    ///
    /// Does nothing while stopped. A missing frame is not an error and
    /// leaves both the sink and the state untouched.
    pub fn on_tick<P: PresentationSink>(&mut self, sink: &mut P) -> TickOutcome {
        if self.state != SessionState::Running {
            return TickOutcome::Idle;
        }

        self.stats.ticks += 1;
        match self.session.read() {
            Some(frame) => {
                sink.show_frame(convert_format(frame, sink.pixel_format()));
                self.stats.forwarded += 1;
                TickOutcome::Forwarded
            }
            None => {
                self.stats.missed += 1;
                TickOutcome::Missed
            }
        }
    }

    /// Run a tick if one is due at `now`.
    pub fn poll<P: PresentationSink>(&mut self, sink: &mut P, now: Instant) -> Option<TickOutcome> {
        if self.ticker.poll(now) {
            Some(self.on_tick(sink))
        } else {
            None
        }
    }

    /// How long the host may sleep before the next tick is due.
    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.ticker.time_until_next(now)
    }

    /// Release the camera on application exit.
    pub fn shutdown(&mut self) {
        if self.state == SessionState::Running {
            self.halt();
        }
        self.session.close();
    }
}

impl<S: CaptureSession> fmt::Debug for DisplayController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayController")
            .field("state", &self.state)
            .field("options", &self.options)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
