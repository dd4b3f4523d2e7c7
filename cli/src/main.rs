use curtain_core::config::ConfigError;
use curtain_core::overlay::OverlaySettings;
use curtain_core::timer::duration_from_ms;
use curtain_core::{paths, Config};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

mod cli;
mod logger;
mod scenario;

use scenario::{Outcome, ScenarioTimings};

#[derive(Debug, Error)]
pub enum CurtainError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("overlay did not settle, last phase {0}")]
    Unsettled(String),
}

pub type CurtainResult<T> = Result<T, CurtainError>;

fn main() -> CurtainResult<()> {
    let args = cli::parse_args();
    let log_file = args
        .log_file
        .clone()
        .or_else(paths::log_file_path)
        .filter(|path| paths::ensure_parent_dir(path).is_ok());
    logger::init_logger(args.quiet, args.verbose, log_file.as_deref())?;

    let mut config = if args.use_defaults {
        Config::default()
    } else {
        Config::load(args.config_path.as_deref())?
    };
    if args.debug_overlay {
        config.overlay.debug = Some(true);
    }

    if let Some(path) = &config.config_path {
        info!("Loaded config from {}", path.display());
    }

    if args.dry_run {
        info!("Configuration is valid: {:?}", config);
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl+C handler: {}", e);
    }

    // Without an explicit delay the styling layer reports the end of the fade on time.
    let fade = OverlaySettings::from_options(&config.overlay).fade_duration_ms;
    let timings = ScenarioTimings {
        hide_after: Duration::from_millis(args.hide_after_ms),
        transition_after: Some(
            args.transition_after_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| duration_from_ms(fade)),
        ),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    info!("Running {:?} scenario", args.scenario);
    match rt.block_on(scenario::run(args.scenario, &config, timings, shutdown)) {
        Outcome::Hidden => {
            info!("Overlay hidden");
            Ok(())
        }
        Outcome::Interrupted => Ok(()),
        Outcome::Inert => {
            warn!("No overlay element, nothing to do");
            Ok(())
        }
        Outcome::TimedOut(phase) => {
            error!("Overlay stuck in {:?}", phase);
            Err(CurtainError::Unsettled(format!("{:?}", phase)))
        }
    }
}
