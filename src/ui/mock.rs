//! Mock UI for testing.

use std::collections::VecDeque;

use crate::environment::{ComponentResult, Verdict};
use crate::error::Result;

use super::{InstallProgress, OutputMode, UserInterface};

/// Records every interaction; confirmations are answered from a queue.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    results: Vec<ComponentResult>,
    verdicts: Vec<(Verdict, String)>,
    confirm_answers: VecDeque<bool>,
    questions: Vec<String>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Answer the next `confirm` with `answer`. Unqueued confirms return
    /// their default.
    pub fn queue_confirm(&mut self, answer: bool) {
        self.confirm_answers.push_back(answer);
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn results(&self) -> &[ComponentResult] {
        &self.results
    }

    pub fn verdicts(&self) -> &[(Verdict, String)] {
        &self.verdicts
    }

    /// Questions asked through `confirm`, in order.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_result(&mut self, result: &ComponentResult) {
        self.results.push(result.clone());
    }

    fn show_verdict(&mut self, verdict: Verdict, message: &str) {
        self.verdicts.push((verdict, message.to_string()));
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        self.questions.push(question.to_string());
        Ok(self.confirm_answers.pop_front().unwrap_or(default))
    }

    fn start_progress(&mut self) -> InstallProgress {
        InstallProgress::hidden()
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
