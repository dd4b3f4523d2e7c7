use crate::cli::Scenario;
use curtain_core::debounce::{delay_from_ms, Debounced};
use curtain_core::host::mock::{MockDocument, MockElement};
use curtain_core::timer::duration_from_ms;
use curtain_core::{init_overlay, Config, OverlayController, OverlayPhase};
use log::{info, trace, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How often the driver samples the overlay phase.
const TICK: Duration = Duration::from_millis(5);
/// Simulated resize events sent while the page is loading.
const RESIZE_BURST: u32 = 5;
const RESIZE_INTERVAL: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Copy)]
pub struct ScenarioTimings {
    pub hide_after: Duration,
    /// `None` means the styling layer never reports the end of the fade.
    pub transition_after: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hidden,
    Interrupted,
    /// The overlay never settled within the deadline.
    TimedOut(OverlayPhase),
    /// The overlay element was missing, so nothing could happen.
    Inert,
}

/// Records phase changes so every transition is logged once.
struct PhaseWatcher {
    started: Instant,
    last: Option<OverlayPhase>,
}

impl PhaseWatcher {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            last: None,
        }
    }

    fn observe(&mut self, controller: &OverlayController<MockElement>) -> Option<OverlayPhase> {
        let phase = controller.phase()?;
        if self.last != Some(phase) {
            info!(
                "{:>5}ms  {:?}",
                self.started.elapsed().as_millis(),
                phase
            );
            self.last = Some(phase);
        }
        Some(phase)
    }
}

pub async fn run(
    scenario: Scenario,
    config: &Config,
    timings: ScenarioTimings,
    shutdown: Arc<AtomicBool>,
) -> Outcome {
    let document = MockDocument::new();
    document.create_element("main", None);
    let selector = config
        .overlay
        .selector
        .clone()
        .unwrap_or_else(|| curtain_core::overlay::DEFAULT_SELECTOR.to_string());
    if let Some(id) = selector.strip_prefix('#') {
        document.create_element("div", Some(id));
    }

    let controller = init_overlay(&document, config.overlay.clone());
    let Some(settings) = controller.settings() else {
        return Outcome::Inert;
    };
    let Some(element) = controller.element() else {
        return Outcome::Inert;
    };

    let resizes = spawn_resize_burst(config.resize_debounce_ms);

    let transition_after = match scenario {
        Scenario::Fallback | Scenario::Failsafe => None,
        _ => timings.transition_after,
    };
    let hide_after = match scenario {
        Scenario::Failsafe => None,
        _ => Some(timings.hide_after),
    };

    // Generous upper bound: failsafe, then a full fade and its fallback.
    let deadline = duration_from_ms(settings.failsafe_ms)
        .saturating_add(timings.hide_after)
        .saturating_add(settings.fallback_delay().saturating_mul(3))
        .saturating_add(transition_after.unwrap_or_default())
        .saturating_add(Duration::from_secs(1));

    let mut watcher = PhaseWatcher::new();
    // An offset too large to represent never arrives.
    let mut hide_at = hide_after.and_then(|d| watcher.started.checked_add(d));
    let mut transition_at: Option<Instant> = None;
    let mut cycles_left = if scenario == Scenario::Show { 2 } else { 1 };

    loop {
        if shutdown.load(Ordering::SeqCst) {
            warn!("Interrupted, destroying overlay");
            controller.destroy();
            return Outcome::Interrupted;
        }

        let now = Instant::now();

        if hide_at.is_some_and(|at| now >= at) {
            hide_at = None;
            info!("page loaded, calling hide()");
            controller.hide();
            transition_at = transition_after.and_then(|d| now.checked_add(d));
        }

        if transition_at.is_some_and(|at| now >= at) {
            transition_at = None;
            trace!("styling layer reports transition end");
            element.finish_transition();
        }

        let Some(phase) = watcher.observe(&controller) else {
            return Outcome::Inert;
        };

        if phase == OverlayPhase::Hidden {
            cycles_left -= 1;
            if cycles_left == 0 {
                break;
            }
            info!("calling show() to start another cycle");
            controller.show();
            watcher.observe(&controller);
            hide_at = Instant::now().checked_add(timings.hide_after);
        }

        if watcher.started.elapsed() > deadline {
            warn!("Overlay did not settle in {:?}", deadline);
            controller.destroy();
            return Outcome::TimedOut(phase);
        }

        tokio::time::sleep(TICK).await;
    }

    info!(
        "debounced resize handler ran {} time(s) for {} event(s)",
        resizes.load(Ordering::SeqCst),
        RESIZE_BURST
    );
    controller.destroy();
    Outcome::Hidden
}

/// Fires a burst of simulated resize events through a debouncer and counts the handler runs.
fn spawn_resize_burst(delay_ms: f64) -> Arc<AtomicUsize> {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let handler = Debounced::new(delay_from_ms(delay_ms), move |size: (u32, u32)| {
        counter.fetch_add(1, Ordering::SeqCst);
        info!("resize handled at {}x{}", size.0, size.1);
    });

    tokio::spawn(async move {
        for i in 0..RESIZE_BURST {
            handler.call((1280 + i * 10, 720));
            tokio::time::sleep(RESIZE_INTERVAL).await;
        }
        // Keep the handle alive until the trailing call has fired.
        tokio::time::sleep(handler.delay() + TICK).await;
    });

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use curtain_core::OverlayOptions;

    fn config(fade_ms: f64, failsafe_ms: f64) -> Config {
        Config {
            overlay: OverlayOptions::defaults()
                .with_fade_duration_ms(fade_ms)
                .with_failsafe_ms(failsafe_ms),
            ..Config::default()
        }
    }

    fn timings(transition_after: Option<u64>) -> ScenarioTimings {
        ScenarioTimings {
            hide_after: Duration::from_millis(20),
            transition_after: transition_after.map(Duration::from_millis),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_scenario_hides() {
        let outcome = run(
            Scenario::Transition,
            &config(40.0, 0.0),
            timings(Some(30)),
            Arc::new(AtomicBool::new(false)),
        )
        .await;
        assert_eq!(outcome, Outcome::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failsafe_scenario_hides() {
        let outcome = run(
            Scenario::Failsafe,
            &config(20.0, 50.0),
            timings(None),
            Arc::new(AtomicBool::new(false)),
        )
        .await;
        assert_eq!(outcome, Outcome::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_scenario_runs_two_cycles() {
        let outcome = run(
            Scenario::Show,
            &config(20.0, 0.0),
            timings(None),
            Arc::new(AtomicBool::new(false)),
        )
        .await;
        assert_eq!(outcome, Outcome::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts() {
        let outcome = run(
            Scenario::Fallback,
            &config(20.0, 0.0),
            timings(None),
            Arc::new(AtomicBool::new(true)),
        )
        .await;
        assert_eq!(outcome, Outcome::Interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_class_selector_is_inert() {
        let mut config = config(20.0, 0.0);
        config.overlay.selector = Some(".spinner".to_string());
        let outcome = run(
            Scenario::Transition,
            &config,
            timings(Some(10)),
            Arc::new(AtomicBool::new(false)),
        )
        .await;
        assert_eq!(outcome, Outcome::Inert);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_hide_time_falls_back_to_failsafe() {
        let outcome = run(
            Scenario::Transition,
            &config(20.0, 50.0),
            ScenarioTimings {
                hide_after: Duration::from_millis(u64::MAX),
                transition_after: Some(Duration::from_millis(u64::MAX)),
            },
            Arc::new(AtomicBool::new(false)),
        )
        .await;
        assert_eq!(outcome, Outcome::Hidden);
    }
}
