//! Visual theme and status markers.

use console::Style;

use crate::environment::{ComponentResult, ComponentStatus, Verdict};

/// Terminal styles used across commands.
#[derive(Debug, Clone)]
pub struct ParallaxTheme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Restart notices.
    pub reboot: Style,
    pub dim: Style,
    pub header: Style,
    /// Keys in `config list` output.
    pub key: Style,
}

impl Default for ParallaxTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallaxTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            reboot: Style::new().cyan().bold(),
            dim: Style::new().dim(),
            header: Style::new().bold(),
            key: Style::new().bold(),
        }
    }

    /// Theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            reboot: Style::new(),
            dim: Style::new(),
            header: Style::new(),
            key: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{} {}", self.success.apply_to("[OK]"), msg)
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{} {}", self.warning.apply_to("[WARN]"), msg)
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{} {}", self.error.apply_to("[FAIL]"), msg)
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        format!("{} {}", self.dim.apply_to("[SKIP]"), msg)
    }

    pub fn format_reboot(&self, msg: &str) -> String {
        format!("{} {}", self.reboot.apply_to("[REBOOT]"), msg)
    }

    pub fn format_header(&self, title: &str) -> String {
        format!("{}", self.header.apply_to(title))
    }

    /// One line for a component result: marker, component name, message.
    pub fn format_result(&self, result: &ComponentResult) -> String {
        let line = format!("{}: {}", result.component.name(), result.message);
        if result.reboot_required {
            return self.format_reboot(&line);
        }
        match result.status {
            ComponentStatus::Success => self.format_success(&line),
            ComponentStatus::Skipped => self.format_skipped(&line),
            ComponentStatus::Warning => self.format_warning(&line),
            ComponentStatus::Failed => self.format_error(&line),
            ComponentStatus::InProgress => format!("{} {}", self.dim.apply_to("[..]"), line),
        }
    }

    /// The closing summary line for a run.
    pub fn format_verdict(&self, verdict: Verdict, message: &str) -> String {
        match verdict {
            Verdict::Success => self.format_success(message),
            Verdict::Warning => self.format_warning(message),
            Verdict::Failed => self.format_error(message),
            Verdict::RebootRequired => self.format_reboot(message),
        }
    }
}

/// Whether colored output is appropriate.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::Term::stdout().is_term()
}
