use crate::host::{HostElementImpl, HostResult, ListenerId, TransitionEvent};
use crate::overlay::config::{
    valid_update, OverlayOptions, OverlaySettings, FADE_DURATION_PROPERTY, FADING_CLASS,
    HIDDEN_ATTRIBUTE,
};
use crate::overlay::OverlayPhase;
use crate::timer::TimerSlot;
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type SharedState<E> = Arc<Mutex<OverlayState<E>>>;

/// Controls the visibility of one overlay element.
///
/// Clones share the same state. An inert controller (returned when the element could not be
/// found) ignores every call. Dropping the last clone cancels all timers.
pub struct OverlayController<E: HostElementImpl> {
    state: Option<SharedState<E>>,
}

impl<E: HostElementImpl> Clone for OverlayController<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<E: HostElementImpl> OverlayController<E> {
    /// Takes over `element`: fills in its ARIA markers, publishes the fade duration and arms the
    /// failsafe.
    pub(crate) fn new(element: E, settings: OverlaySettings) -> Self {
        let state = Arc::new_cyclic(|this| {
            Mutex::new(OverlayState {
                this: this.clone(),
                element,
                settings,
                timers: OverlayTimers::default(),
                transition_listener: None,
                is_fading: false,
                destroyed: false,
            })
        });

        {
            let mut guard = lock(&state);
            guard.ensure_aria_attributes();
            guard.apply_fade_duration();
            guard.start_failsafe();
        }

        Self { state: Some(state) }
    }

    pub fn inert() -> Self {
        Self { state: None }
    }

    /// Fades the overlay out and applies `hidden` once the fade is over. Does nothing if the
    /// overlay is already fading or hidden.
    pub fn hide(&self) {
        self.with_state(|state| state.hide_with_transition());
    }

    /// Shows the overlay immediately and cancels every pending timer.
    pub fn show(&self) {
        self.with_state(|state| state.show());
    }

    /// Cancels timers and listeners. Every later call is ignored.
    pub fn destroy(&self) {
        if let Some(shared) = &self.state {
            lock(shared).destroy();
        }
    }

    /// Applies a partial update. Missing or invalid fields are ignored.
    pub fn set_options(&self, next: OverlayOptions) {
        self.with_state(|state| state.set_options(next));
    }

    /// `None` for an inert controller.
    pub fn phase(&self) -> Option<OverlayPhase> {
        self.state.as_ref().map(|shared| lock(shared).phase())
    }

    pub fn is_inert(&self) -> bool {
        self.state.is_none()
    }

    pub fn settings(&self) -> Option<OverlaySettings> {
        self.state
            .as_ref()
            .map(|shared| lock(shared).settings.clone())
    }

    /// Number of timer slots currently holding a live timer (0 to 2).
    pub fn armed_timers(&self) -> usize {
        self.state.as_ref().map_or(0, |shared| {
            let state = lock(shared);
            state.timers.failsafe.is_armed() as usize
                + state.timers.transition_fallback.is_armed() as usize
        })
    }

    pub fn element(&self) -> Option<E> {
        self.state
            .as_ref()
            .map(|shared| lock(shared).element.clone())
    }

    /// Runs `f` unless the controller is inert or destroyed.
    fn with_state<F>(&self, f: F)
    where
        F: FnOnce(&mut OverlayState<E>),
    {
        let Some(shared) = &self.state else {
            return;
        };
        let mut state = lock(shared);
        if state.destroyed {
            return;
        }
        f(&mut state);
    }
}

fn lock<E: HostElementImpl>(shared: &SharedState<E>) -> MutexGuard<'_, OverlayState<E>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Entry point for timer and listener callbacks, which only hold a weak reference.
fn with_live_state<E, F>(this: &Weak<Mutex<OverlayState<E>>>, f: F)
where
    E: HostElementImpl,
    F: FnOnce(&mut OverlayState<E>),
{
    let Some(shared) = this.upgrade() else {
        return;
    };
    let mut state = lock(&shared);
    if state.destroyed {
        return;
    }
    f(&mut state);
}

#[derive(Default)]
struct OverlayTimers {
    failsafe: TimerSlot,
    transition_fallback: TimerSlot,
}

impl OverlayTimers {
    fn clear_all(&mut self) {
        self.failsafe.clear();
        self.transition_fallback.clear();
    }
}

#[derive(Debug, Clone, Copy)]
enum HideResolution {
    TransitionEnd,
    Fallback,
}

struct OverlayState<E: HostElementImpl> {
    this: Weak<Mutex<OverlayState<E>>>,
    element: E,
    settings: OverlaySettings,
    timers: OverlayTimers,
    transition_listener: Option<ListenerId>,
    /// True from the start of a fade until exactly one of the transition-end listener or the
    /// fallback timer applies `hidden`.
    is_fading: bool,
    destroyed: bool,
}

impl<E: HostElementImpl> OverlayState<E> {
    fn phase(&self) -> OverlayPhase {
        if self.destroyed {
            OverlayPhase::Destroyed
        } else if self.is_fading {
            OverlayPhase::Fading
        } else if self.element.has_attribute(HIDDEN_ATTRIBUTE) {
            OverlayPhase::Hidden
        } else {
            OverlayPhase::Visible
        }
    }

    fn log(&self, message: &str) {
        if self.settings.debug {
            debug!("[{}] {}", self.settings.selector, message);
        }
    }

    fn report(&self, action: &str, result: HostResult<()>) {
        if let Err(e) = result {
            warn!("[{}] failed to {}: {}", self.settings.selector, action, e);
        }
    }

    fn ensure_aria_attributes(&self) {
        if !self.element.has_attribute("role") {
            self.report("set role", self.element.set_attribute("role", "status"));
        }
        if !self.element.has_attribute("aria-live") {
            self.report(
                "set aria-live",
                self.element.set_attribute("aria-live", "polite"),
            );
        }
        self.report(
            "set aria-busy",
            self.element.set_attribute("aria-busy", "true"),
        );
    }

    fn apply_fade_duration(&self) {
        self.report(
            "set fade duration",
            self.element
                .set_style_property(FADE_DURATION_PROPERTY, &self.settings.fade_duration_value()),
        );
    }

    /// (Re)starts the failsafe from zero. A non-positive failsafe only cancels the old one.
    fn start_failsafe(&mut self) {
        self.timers.failsafe.clear();

        let Some(delay) = self.settings.failsafe_delay() else {
            return;
        };

        let this = self.this.clone();
        self.timers.failsafe.arm(delay, move |token| {
            with_live_state(&this, |state| {
                if !state.timers.failsafe.settle(token) {
                    return;
                }
                state.log("failsafe timeout");
                state.hide_with_transition();
            });
        });
    }

    fn hide_with_transition(&mut self) {
        if self.element.has_attribute(HIDDEN_ATTRIBUTE) || self.is_fading {
            return;
        }

        self.is_fading = true;

        self.detach_transition_listener();
        let this = self.this.clone();
        match self
            .element
            .add_transition_listener(Arc::new(move |event: &TransitionEvent| {
                with_live_state(&this, |state| state.on_transition_end(event));
            })) {
            Ok(id) => self.transition_listener = Some(id),
            Err(e) => warn!(
                "[{}] failed to listen for transition end, relying on fallback: {}",
                self.settings.selector, e
            ),
        }

        let this = self.this.clone();
        self.timers
            .transition_fallback
            .arm(self.settings.fallback_delay(), move |token| {
                with_live_state(&this, |state| {
                    if !state.timers.transition_fallback.settle(token) {
                        return;
                    }
                    if state.is_fading {
                        state.finish_hide(HideResolution::Fallback);
                    }
                });
            });

        self.report("add fading class", self.element.add_class(FADING_CLASS));
        self.log("start fade-out");
    }

    fn on_transition_end(&mut self, event: &TransitionEvent) {
        // Transition events bubble up from descendants.
        if event.target != self.element.id() {
            return;
        }
        if !self.is_fading {
            return;
        }
        self.finish_hide(HideResolution::TransitionEnd);
    }

    fn finish_hide(&mut self, resolution: HideResolution) {
        self.report(
            "apply hidden",
            self.element.set_attribute(HIDDEN_ATTRIBUTE, ""),
        );
        self.report("remove fading class", self.element.remove_class(FADING_CLASS));
        self.is_fading = false;
        self.timers.transition_fallback.clear();
        self.detach_transition_listener();

        match resolution {
            HideResolution::TransitionEnd => self.log("hidden applied (transition end)"),
            HideResolution::Fallback => self.log("hidden (transition fallback)"),
        }
    }

    fn show(&mut self) {
        self.timers.clear_all();
        self.report(
            "remove hidden",
            self.element.remove_attribute(HIDDEN_ATTRIBUTE),
        );
        self.report("remove fading class", self.element.remove_class(FADING_CLASS));
        self.is_fading = false;
        self.detach_transition_listener();
        self.log("show");
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.timers.clear_all();
        self.detach_transition_listener();
        self.is_fading = false;
        self.destroyed = true;
        self.log("destroyed");
    }

    fn set_options(&mut self, next: OverlayOptions) {
        if let Some(ms) = valid_update(next.fade_duration_ms) {
            self.settings.fade_duration_ms = ms;
            self.apply_fade_duration();
        }
        if let Some(ms) = valid_update(next.failsafe_ms) {
            self.settings.failsafe_ms = ms;
            self.start_failsafe();
        }
        if let Some(debug) = next.debug {
            self.settings.debug = debug;
        }

        self.log(&format!(
            "options updated (fade_duration_ms: {}, failsafe_ms: {}, debug: {})",
            self.settings.fade_duration_ms, self.settings.failsafe_ms, self.settings.debug
        ));
    }

    fn detach_transition_listener(&mut self) {
        if let Some(id) = self.transition_listener.take() {
            self.report(
                "remove transition listener",
                self.element.remove_transition_listener(id),
            );
        }
    }
}

impl<E: HostElementImpl> Drop for OverlayState<E> {
    fn drop(&mut self) {
        self.detach_transition_listener();
    }
}
