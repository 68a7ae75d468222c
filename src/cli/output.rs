//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {msg}", style(">>").cyan().bold());
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {msg}", style(">>").green().bold());
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {msg}", style(">>").yellow().bold());
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {msg}", style(">>").red().bold());
    }

    /// Print a section header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one labeled lesson suggestion.
    pub fn lesson(label: &str, text: &str) {
        println!("  {} {text}", style(format!("{label}:")).bold());
    }

    /// Create a spinner for a long-running pipeline step.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format an estimated duration in minutes for display.
pub fn format_minutes(minutes: f64) -> String {
    if minutes < 1.0 {
        return format!("{}s", (minutes * 60.0).round() as u64);
    }
    let whole = minutes.floor() as u64;
    let secs = ((minutes - whole as f64) * 60.0).round() as u64;
    if secs > 0 {
        format!("{whole}m {secs}s")
    } else {
        format!("{whole}m")
    }
}
