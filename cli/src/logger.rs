use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

pub struct CurtainLogger {
    max_level: Level,
    log_file: Mutex<Option<File>>,
    target_colors: Mutex<HashMap<String, usize>>,
    next_color_index: AtomicUsize,
}

impl CurtainLogger {
    pub fn new(quiet: bool, verbose: bool, log_path: Option<&Path>) -> Self {
        let log_file = log_path.and_then(|path| {
            match OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
            {
                Ok(file) => Some(file),
                Err(e) => {
                    eprintln!("Warning: Failed to open log file at {:?}: {}", path, e);
                    None
                }
            }
        });

        Self {
            max_level: max_level(quiet, verbose),
            log_file: Mutex::new(log_file),
            target_colors: Mutex::new(HashMap::new()),
            next_color_index: AtomicUsize::new(0),
        }
    }

    fn color_for_target(&self, target: &str) -> String {
        let colors: &[fn(&str) -> ColoredString] = &[
            |s| s.green(),
            |s| s.yellow(),
            |s| s.blue(),
            |s| s.magenta(),
            |s| s.cyan(),
        ];

        let color_index = match self.target_colors.lock() {
            Ok(mut target_colors) => *target_colors
                .entry(target.to_string())
                .or_insert_with(|| {
                    self.next_color_index.fetch_add(1, Ordering::SeqCst) % colors.len()
                }),
            Err(_) => 0,
        };

        colors[color_index](target).to_string()
    }

    fn format_log(&self, record: &Record) -> String {
        let level_str = level_tag(record.level());

        let target = short_target(record.target())
            .map(|t| format!("[{}] ", self.color_for_target(t).dimmed()))
            .unwrap_or_default();

        let message = format!("{} {}{}", level_str, target, record.args());

        match record.level() {
            Level::Error => message.red().bold().to_string(),
            Level::Warn => message.yellow().bold().to_string(),
            level => {
                let colored_level = match level {
                    Level::Info => level_str.green().bold(),
                    Level::Debug => level_str.blue().bold(),
                    _ => level_str.white().bold(),
                };
                message.replacen(level_str, &colored_level.to_string(), 1)
            }
        }
    }

    fn format_log_plain(&self, record: &Record) -> String {
        let target = short_target(record.target())
            .map(|t| format!("[{}] ", t))
            .unwrap_or_default();

        format!("{} {}{}", level_tag(record.level()), target, record.args())
    }
}

fn max_level(quiet: bool, verbose: bool) -> Level {
    if quiet {
        Level::Info
    } else if verbose {
        Level::Trace
    } else {
        Level::Debug
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "[E]",
        Level::Warn => "[W]",
        Level::Info => "[I]",
        Level::Debug => "[D]",
        Level::Trace => "[T]",
    }
}

/// Last path segment of a log target, e.g. `controller` for `curtain_core::overlay::controller`.
fn short_target(target: &str) -> Option<&str> {
    if target.is_empty() {
        return None;
    }
    target.rsplit("::").next()
}

impl Log for CurtainLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        println!("{}", self.format_log(record));

        if let Ok(mut file_opt) = self.log_file.lock() {
            if let Some(file) = file_opt.as_mut() {
                let _ = writeln!(file, "{}", self.format_log_plain(record));
                let _ = file.flush();
            }
        }
    }

    fn flush(&self) {}
}

pub fn init_logger(
    quiet: bool,
    verbose: bool,
    log_path: Option<&Path>,
) -> Result<(), log::SetLoggerError> {
    let logger = CurtainLogger::new(quiet, verbose, log_path);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(max_level(true, false), Level::Info);
        assert_eq!(max_level(false, true), Level::Trace);
        assert_eq!(max_level(false, false), Level::Debug);
    }

    #[test]
    fn test_short_target() {
        assert_eq!(
            short_target("curtain_core::overlay::controller"),
            Some("controller")
        );
        assert_eq!(short_target("curtain"), Some("curtain"));
        assert_eq!(short_target(""), None);
    }

    #[test]
    fn test_plain_format() {
        let logger = CurtainLogger::new(false, false, None);
        let line = logger.format_log_plain(
            &Record::builder()
                .level(Level::Warn)
                .target("curtain_core::overlay")
                .args(format_args!("element not found: #loading"))
                .build(),
        );
        assert_eq!(line, "[W] [overlay] element not found: #loading");
    }
}
