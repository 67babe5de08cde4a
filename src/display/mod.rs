//! Timer-driven display loop: toggles, ticks and the presentation sink.

mod controller;
mod sink;
mod ticker;

pub use controller::{DisplayController, LoopOptions, LoopStats, SessionState, TickOutcome};
pub use sink::PresentationSink;
pub use ticker::{Ticker, DEFAULT_TICK_HZ};
