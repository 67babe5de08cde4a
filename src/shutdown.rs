//! Ctrl+C handling for a clean camera release.

use std::sync::atomic::{AtomicBool, Ordering};

static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Check whether Ctrl+C was pressed.
pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup. The window polls
/// [`ctrlc_received`] every frame and closes itself, which releases the
/// camera through the normal exit path.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })
}
