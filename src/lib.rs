//! sift-cam library crate.
//!
//! Live camera capture driven by a start/stop display loop, plus template
//! image loading. The GUI in `gui` is a thin host over `display`.

pub mod camera;
pub mod cli;
pub mod config;
pub mod display;
pub mod gui;
pub mod shutdown;
pub mod template;
