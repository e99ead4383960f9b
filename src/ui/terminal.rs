//! Interactive terminal UI.

use std::io::{self, IsTerminal, Write};

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use crate::environment::{ComponentResult, Verdict};
use crate::error::{EnvError, Result};

use super::{should_use_colors, InstallProgress, OutputMode, ParallaxTheme, UserInterface};

/// Writes to stdout through `console`, prompts through `dialoguer`.
pub struct TerminalUI {
    term: Term,
    theme: ParallaxTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode) -> Self {
        let theme = if should_use_colors() {
            ParallaxTheme::new()
        } else {
            ParallaxTheme::plain()
        };

        Self {
            term: Term::stdout(),
            theme,
            mode,
        }
    }

    fn line(&mut self, text: &str) {
        writeln!(self.term, "{}", text).ok();
    }
}

/// Build the terminal UI for `mode`.
pub fn create_ui(mode: OutputMode) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode))
}

fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.line(msg);
    }

    fn success(&mut self, msg: &str) {
        let text = self.theme.format_success(msg);
        self.line(&text);
    }

    fn warning(&mut self, msg: &str) {
        let text = self.theme.format_warning(msg);
        self.line(&text);
    }

    fn error(&mut self, msg: &str) {
        let text = self.theme.format_error(msg);
        writeln!(Term::stderr(), "{}", text).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_progress() {
            let text = self.theme.format_header(title);
            self.line(&format!("\n{}\n", text));
        }
    }

    fn show_result(&mut self, result: &ComponentResult) {
        let text = self.theme.format_result(result);
        self.line(&text);
    }

    fn show_verdict(&mut self, verdict: Verdict, message: &str) {
        let text = self.theme.format_verdict(verdict, message);
        self.line("");
        self.line(&text);
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        if !self.is_interactive() {
            return Ok(default);
        }
        Confirm::with_theme(&prompt_theme())
            .with_prompt(question)
            .default(default)
            .interact_on(&self.term)
            .map_err(|e| EnvError::Io(e.into()))
    }

    fn start_progress(&mut self) -> InstallProgress {
        if self.mode.shows_progress() && self.term.is_term() {
            InstallProgress::new()
        } else {
            InstallProgress::hidden()
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term() && io::stdin().is_terminal()
    }
}
