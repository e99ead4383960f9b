//! parallax-env CLI entry point.

use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use parallax_env::cli::{Cli, CommandDispatcher};
use parallax_env::config::ConfigStore;
use parallax_env::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN, so the terminal shows results rather than logs
///
/// `--log-file` adds a second, uncolored layer writing to that file.
fn init_tracing(debug: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if debug {
        EnvFilter::new("parallax_env=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parallax_env=warn"))
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    init_tracing(cli.debug, cli.log_file.as_deref())?;
    tracing::debug!("parallax-env starting with args: {:?}", cli);

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let path = cli.config.clone().unwrap_or_else(ConfigStore::default_path);
    let config = ConfigStore::load(&path)
        .with_context(|| format!("cannot load configuration from {}", path.display()))?;

    let mode = if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut ui = create_ui(mode);

    let dispatcher = CommandDispatcher::new(config);
    let result = dispatcher.dispatch(cli, ui.as_mut())?;
    Ok(result.exit_code)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
