//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A task spinner with CI fallback.
///
/// Cloning shares the underlying spinner, so a clone can be handed to an
/// output listener while the original is finished by the caller.
#[derive(Clone)]
pub struct TaskSpinner {
    bar: Option<ProgressBar>,
}

impl TaskSpinner {
    /// Start a spinner with `message` (plain line outside a terminal)
    pub fn start(ctx: &UiContext, message: &str) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new_spinner();
            if let Ok(spinner_style) = ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            {
                bar.set_style(spinner_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
            }
            bar.set_message(message.to_string());
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            eprintln!("{} {}", style("...").dim(), message);
            None
        };
        Self { bar }
    }

    /// Show the latest tool output line next to the spinner
    pub fn on_line(&self, line: &str) {
        let Some(ref bar) = self.bar else {
            return;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        let display = if trimmed.chars().count() > 60 {
            let head: String = trimmed.chars().take(57).collect();
            format!("{}...", head)
        } else {
            trimmed.to_string()
        };
        bar.set_message(display);
    }

    /// Stop with success message
    pub fn stop(&self, message: &str) {
        self.finish();
        if self.bar.is_some() {
            eprintln!("{} {}", style("✓").green(), message);
        } else {
            eprintln!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&self, message: &str) {
        self.finish();
        if self.bar.is_some() {
            eprintln!("{} {}", style("✗").red(), message);
        } else {
            eprintln!("{} {}", style("[FAIL]").red(), message);
        }
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}
