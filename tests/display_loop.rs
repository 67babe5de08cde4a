//! Display loop behaviour against a scripted capture session.
//!
//! The session records every call it receives so ordering guarantees
//! (stop ticking before close, no reads while stopped) can be checked.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use sift_cam::camera::{CaptureError, CaptureSession, Frame, PixelFormat, Resolution};
use sift_cam::display::{
    DisplayController, LoopOptions, PresentationSink, SessionState, TickOutcome,
};
use sift_cam::template::TemplateImage;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Configure(Resolution),
    Open(u32),
    Read { yielded: bool },
    Close,
}

/// Capture session driven by a script of read results.
#[derive(Default)]
struct FakeSession {
    calls: Vec<Call>,
    open: bool,
    unavailable: bool,
    reads: VecDeque<bool>,
}

impl FakeSession {
    fn with_reads(reads: &[bool]) -> Self {
        Self {
            reads: reads.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl CaptureSession for FakeSession {
    fn open(&mut self, device_index: u32) -> Result<(), CaptureError> {
        self.calls.push(Call::Open(device_index));
        if self.unavailable {
            return Err(CaptureError::DeviceUnavailable {
                index: device_index,
                reason: "no such device".to_string(),
            });
        }
        self.open = true;
        Ok(())
    }

    fn configure(&mut self, resolution: Resolution) {
        self.calls.push(Call::Configure(resolution));
    }

    fn read(&mut self) -> Option<Frame> {
        let yielded = self.reads.pop_front().unwrap_or(false);
        self.calls.push(Call::Read { yielded });
        if yielded {
            Frame::from_raw(2, 2, PixelFormat::Bgr, vec![1, 2, 3].repeat(4))
        } else {
            None
        }
    }

    fn close(&mut self) {
        self.calls.push(Call::Close);
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[derive(Default)]
struct RecordingSink {
    frames: Vec<Frame>,
    templates: Vec<TemplateImage>,
    errors: Vec<CaptureError>,
    states: Vec<SessionState>,
}

impl PresentationSink for RecordingSink {
    fn show_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    fn show_template(&mut self, template: TemplateImage) {
        self.templates.push(template);
    }

    fn show_error(&mut self, error: &CaptureError) {
        self.errors.push(error.clone());
    }

    fn capture_state_changed(&mut self, state: SessionState) {
        self.states.push(state);
    }
}

fn controller(session: FakeSession) -> DisplayController<FakeSession> {
    DisplayController::new(session, LoopOptions::default())
}

#[test]
fn test_unavailable_device_surfaces_error_and_stays_stopped() {
    let mut ctl = controller(FakeSession::unavailable());
    let mut sink = RecordingSink::default();

    let result = ctl.on_toggle(&mut sink, Instant::now());

    assert!(matches!(
        result,
        Err(CaptureError::DeviceUnavailable { index: 0, .. })
    ));
    assert_eq!(ctl.state(), SessionState::Stopped);
    assert!(!ctl.session().is_open());
    assert_eq!(sink.errors.len(), 1);
    assert!(sink.states.is_empty());

    // No ticking after a failed start
    assert_eq!(ctl.on_tick(&mut sink), TickOutcome::Idle);
    assert_eq!(ctl.session().count(|c| matches!(c, Call::Read { .. })), 0);
}

#[test]
fn test_five_ticks_three_frames_forward_exactly_three() {
    let mut ctl = controller(FakeSession::with_reads(&[true, false, true, false, true]));
    let mut sink = RecordingSink::default();
    ctl.on_toggle(&mut sink, Instant::now()).unwrap();

    let outcomes: Vec<TickOutcome> = (0..5).map(|_| ctl.on_tick(&mut sink)).collect();

    assert_eq!(
        outcomes,
        vec![
            TickOutcome::Forwarded,
            TickOutcome::Missed,
            TickOutcome::Forwarded,
            TickOutcome::Missed,
            TickOutcome::Forwarded,
        ]
    );
    assert_eq!(sink.frames.len(), 3);
    assert!(sink.errors.is_empty());
    assert_eq!(ctl.state(), SessionState::Running);
    assert_eq!(ctl.stats().forwarded, 3);
    assert_eq!(ctl.stats().missed, 2);
    // Frames arrive in the sink's layout
    assert!(sink.frames.iter().all(|f| f.format() == PixelFormat::Rgb));
    assert_eq!(&sink.frames[0].data()[..3], &[3, 2, 1]);
}

#[test]
fn test_toggle_off_before_first_tick_forwards_nothing() {
    let mut ctl = controller(FakeSession::with_reads(&[true, true]));
    let mut sink = RecordingSink::default();
    let t0 = Instant::now();

    ctl.on_toggle(&mut sink, t0).unwrap();
    assert_eq!(ctl.poll(&mut sink, t0 + Duration::from_millis(10)), None);
    ctl.on_toggle(&mut sink, t0 + Duration::from_millis(20)).unwrap();

    // Well past the first due tick
    assert_eq!(ctl.poll(&mut sink, t0 + Duration::from_secs(1)), None);

    assert_eq!(
        ctl.session().calls,
        vec![Call::Configure(Resolution::LOW), Call::Open(0), Call::Close]
    );
    assert!(sink.frames.is_empty());
    assert_eq!(sink.states, vec![SessionState::Running, SessionState::Stopped]);
}

#[test]
fn test_missed_frame_has_no_side_effects() {
    let mut ctl = controller(FakeSession::with_reads(&[false]));
    let mut sink = RecordingSink::default();
    ctl.on_toggle(&mut sink, Instant::now()).unwrap();
    let states_before = sink.states.clone();

    assert_eq!(ctl.on_tick(&mut sink), TickOutcome::Missed);

    assert!(sink.frames.is_empty());
    assert!(sink.errors.is_empty());
    assert_eq!(sink.states, states_before);
    assert_eq!(ctl.state(), SessionState::Running);
}

#[test]
fn test_stopping_closes_after_last_read_and_never_reads_again() {
    let mut ctl = controller(FakeSession::with_reads(&[true, true, true]));
    let mut sink = RecordingSink::default();
    let t0 = Instant::now();

    ctl.on_toggle(&mut sink, t0).unwrap();
    ctl.poll(&mut sink, t0 + Duration::from_millis(100));
    ctl.on_toggle(&mut sink, t0 + Duration::from_millis(150)).unwrap();
    ctl.poll(&mut sink, t0 + Duration::from_millis(200));
    ctl.on_tick(&mut sink);

    let calls = &ctl.session().calls;
    let close_at = calls.iter().position(|c| *c == Call::Close).unwrap();
    assert!(calls[close_at + 1..]
        .iter()
        .all(|c| !matches!(c, Call::Read { .. })));
    assert_eq!(sink.frames.len(), 1);
}

#[test]
fn test_poll_ticks_at_configured_rate() {
    let options = LoopOptions {
        tick_hz: 4,
        ..LoopOptions::default()
    };
    let mut ctl = DisplayController::new(FakeSession::with_reads(&[true; 8]), options);
    let mut sink = RecordingSink::default();
    let t0 = Instant::now();
    ctl.on_toggle(&mut sink, t0).unwrap();

    // Poll every 10ms for one second
    let fired = (1..=100)
        .filter_map(|i| ctl.poll(&mut sink, t0 + Duration::from_millis(i * 10)))
        .count();

    assert_eq!(fired, 4);
    assert_eq!(ctl.tick_interval(), Duration::from_millis(250));
}

#[test]
fn test_restart_after_failure_needs_a_new_toggle() {
    let mut ctl = controller(FakeSession::unavailable());
    let mut sink = RecordingSink::default();

    assert!(ctl.on_toggle(&mut sink, Instant::now()).is_err());
    assert!(ctl.on_toggle(&mut sink, Instant::now()).is_err());

    // One open attempt per toggle, no automatic retry
    assert_eq!(ctl.session().count(|c| matches!(c, Call::Open(_))), 2);
    assert_eq!(sink.errors.len(), 2);
}

#[derive(Debug, Clone)]
enum Op {
    Toggle,
    Tick,
    Wait(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Toggle),
        Just(Op::Tick),
        (1u64..400).prop_map(Op::Wait),
    ]
}

proptest! {
    #[test]
    fn test_session_open_iff_running(
        ops in proptest::collection::vec(op(), 0..60),
        reads in proptest::collection::vec(any::<bool>(), 0..60),
        unavailable in any::<bool>(),
    ) {
        let mut session = FakeSession::with_reads(&reads);
        session.unavailable = unavailable;
        let mut ctl = controller(session);
        let mut sink = RecordingSink::default();
        let mut now = Instant::now();

        for op in ops {
            match op {
                Op::Toggle => {
                    let _ = ctl.on_toggle(&mut sink, now);
                }
                Op::Tick => {
                    ctl.on_tick(&mut sink);
                }
                Op::Wait(ms) => {
                    now += Duration::from_millis(ms);
                    ctl.poll(&mut sink, now);
                }
            }
            prop_assert_eq!(
                ctl.session().is_open(),
                ctl.state() == SessionState::Running
            );
        }

        // Reads only ever happen between a successful open and the next close
        let mut open = false;
        for call in &ctl.session().calls {
            match call {
                Call::Open(_) => open = !unavailable,
                Call::Close => open = false,
                Call::Read { .. } => {
                    prop_assert!(open);
                }
                Call::Configure(_) => {}
            }
        }

        let yielded = ctl
            .session()
            .count(|c| matches!(c, Call::Read { yielded: true }));
        prop_assert_eq!(sink.frames.len(), yielded);
    }
}
