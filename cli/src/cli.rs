use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "Curtain",
    version = curtain_core::version(),
    about = "Curtain - drive a loading overlay through its fade-out against a simulated page",
)]
pub struct Args {
    /// Specify custom configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Validate configuration and exit without running a scenario
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Use default configuration and ignore config files
    #[arg(long = "defaults")]
    pub use_defaults: bool,

    /// Only print info, warnings and errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print everything, including trace output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Also write plain log lines to this file
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// How the simulated page drives the overlay
    #[arg(short = 's', long = "scenario", value_enum, default_value_t = Scenario::Transition)]
    pub scenario: Scenario,

    /// When the page finishes loading and calls hide()
    #[arg(long = "hide-after-ms", value_name = "MS", default_value_t = 200)]
    pub hide_after_ms: u64,

    /// When the styling layer reports the end of the fade, counted from hide()
    #[arg(long = "transition-after-ms", value_name = "MS")]
    pub transition_after_ms: Option<u64>,

    /// Log every overlay state change regardless of the config file
    #[arg(long = "debug-overlay")]
    pub debug_overlay: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Never call hide(); the failsafe has to do it
    Failsafe,
    /// hide() after load, the transition end arrives in time
    Transition,
    /// hide() after load, the transition end never arrives
    Fallback,
    /// hide(), show() again, then a second hide() cycle
    Show,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["curtain"]);
        assert_eq!(args.scenario, Scenario::Transition);
        assert_eq!(args.hide_after_ms, 200);
        assert_eq!(args.transition_after_ms, None);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_scenario_and_timings() {
        let args = Args::parse_from([
            "curtain",
            "--scenario",
            "fallback",
            "--hide-after-ms",
            "0",
            "--transition-after-ms",
            "50",
            "-q",
        ]);
        assert_eq!(args.scenario, Scenario::Fallback);
        assert_eq!(args.hide_after_ms, 0);
        assert_eq!(args.transition_after_ms, Some(50));
        assert!(args.quiet);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["curtain", "-q", "-v"]).is_err());
    }
}
