//! Install progress display.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::environment::OutputSink;
use crate::shell::OutputLine;

const TEMPLATE: &str = "{spinner} [{bar:30}] {pos:>3}% {prefix:.bold} {wide_msg}";

/// Progress bar driven by the installer's `(label, message, percent)`
/// callback. Relayed command output is printed above the bar so the two
/// never interleave on one line.
pub struct InstallProgress {
    bar: ProgressBar,
}

impl InstallProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// A bar that draws nothing, for quiet mode and tests.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Apply one progress event.
    pub fn update(&self, label: &str, message: &str, percent: u8) {
        self.bar.set_prefix(label.to_string());
        self.bar.set_message(message.to_string());
        self.bar.set_position(u64::from(percent.min(100)));
    }

    /// Print a line above the bar.
    pub fn println(&self, line: &str) {
        self.bar.println(line);
    }

    /// Sink for relayed output that prints through the bar.
    pub fn output_sink(&self) -> OutputSink {
        let bar = self.bar.clone();
        Arc::new(move |line| match line {
            OutputLine::Stdout(text) | OutputLine::Stderr(text) => bar.println(text),
        })
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for InstallProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Sink that discards relayed output.
pub fn discard_sink() -> OutputSink {
    Arc::new(|_| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_progress_tracks_position() {
        let progress = InstallProgress::hidden();
        progress.update("OS Version", "Installing OS Version...", 12);
        assert_eq!(progress.position(), 12);
        progress.update("Complete", "done", 100);
        assert_eq!(progress.position(), 100);
        progress.finish();
    }

    #[test]
    fn sink_accepts_both_streams() {
        let progress = InstallProgress::hidden();
        let sink = progress.output_sink();
        sink(OutputLine::Stdout("Collecting torch".to_string()));
        sink(OutputLine::Stderr("warning: cache miss".to_string()));
    }
}
