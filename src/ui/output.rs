//! Output verbosity.

use std::str::FromStr;

/// How much the CLI prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Progress bar, live install output and per-component status.
    #[default]
    Normal,
    /// Per-component status and the summary only.
    Quiet,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("unknown output mode: {}", s)),
        }
    }
}

impl OutputMode {
    /// Whether progress bars and live command output are drawn.
    pub fn shows_progress(&self) -> bool {
        matches!(self, Self::Normal)
    }
}
