//! Terminal output and prompts.
//!
//! Commands talk to the operator through [`UserInterface`] so they can be
//! exercised with [`MockUI`] in tests.
//!
//! # Example
//!
//! ```
//! use parallax_env::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.queue_confirm(true);
//!
//! ui.success("Configuration saved");
//! assert!(ui.confirm("Reset configuration?", false).unwrap());
//! assert_eq!(ui.successes(), ["Configuration saved"]);
//! ```

pub mod mock;
pub mod output;
pub mod progress;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::OutputMode;
pub use progress::{discard_sink, InstallProgress};
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, ParallaxTheme};

use crate::environment::{ComponentResult, Verdict};
use crate::error::Result;

/// Operator-facing output.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// Plain line.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    /// Always shown, whatever the output mode.
    fn error(&mut self, msg: &str);

    fn show_header(&mut self, title: &str);

    /// One component's check or install result.
    fn show_result(&mut self, result: &ComponentResult);

    /// The closing line of a check or install run.
    fn show_verdict(&mut self, verdict: Verdict, message: &str);

    /// Yes/no question. Non-interactive implementations return `default`.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Progress display for an install run.
    fn start_progress(&mut self) -> InstallProgress;

    fn is_interactive(&self) -> bool;
}
