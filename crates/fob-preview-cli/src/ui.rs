//! Terminal status output.
//!
//! Everything here writes to stderr; stdout is reserved for documents.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Configure color output for stderr.
///
/// `NO_COLOR` and `--no-color` disable colors, `FORCE_COLOR` enables them
/// on non-terminals.
pub fn init_colors(no_color: bool) {
    console::set_colors_enabled_stderr(should_use_color(no_color));
}

fn should_use_color(no_color: bool) -> bool {
    if no_color || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Spinner for the bundling step.
///
/// Hidden when stderr is not a terminal, so piped output stays clean.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::user_attended_stderr() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(template.tick_strings(&["◐", "◓", "◑", "◒", "✓"]));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    /// Clear the spinner line. Status is reported separately.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Format a byte count for status lines.
pub fn format_size(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
