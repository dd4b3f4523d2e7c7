mod config;
mod controller;

pub use config::{
    OverlayOptions, OverlaySettings, DEFAULT_FADE_DURATION_MS, DEFAULT_FAILSAFE_MS,
    DEFAULT_SELECTOR, FADE_DURATION_PROPERTY, FADING_CLASS, HIDDEN_ATTRIBUTE,
};
pub use controller::OverlayController;

use crate::host::HostDocumentImpl;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Visible,
    Fading,
    Hidden,
    /// Terminal. Every operation is ignored from here on.
    Destroyed,
}

/// Looks up the overlay element and returns a controller for it.
///
/// If no element matches the selector, a warning is logged and an inert controller is returned,
/// so callers never have to guard against missing markup.
pub fn init_overlay<D>(document: &D, options: OverlayOptions) -> OverlayController<D::Element>
where
    D: HostDocumentImpl,
{
    let settings = OverlaySettings::from_options(&options);
    match document.query_selector(&settings.selector) {
        Some(element) => OverlayController::new(element, settings),
        None => {
            warn!("element not found: {}", settings.selector);
            OverlayController::inert()
        }
    }
}
