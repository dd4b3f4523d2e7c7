//! Timer-coordinated visibility control for a loading overlay.
//!
//! - [`debounce`]: trailing-edge debouncing with explicit cancellation
//! - [`overlay`]: the fade-out / hide state machine with failsafe and transition fallback
//! - [`host`]: the document/element seam the overlay drives, plus an in-memory mock
//!
//! Timers run on the caller's tokio runtime, or on a background timer thread when there is none.

pub mod config;
pub mod debounce;
pub mod host;
pub mod overlay;
pub mod paths;
pub mod timer;

pub use config::Config;
pub use debounce::{debounce, Debounced};
pub use overlay::{init_overlay, OverlayController, OverlayOptions, OverlayPhase};

pub fn version() -> &'static str {
    option_env!("VERSION").unwrap_or("v0.0.0-dev")
}
