//! The `config` command: list, get, set and reset stored values.

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::ConfigStore;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Exit code for an unknown key.
pub const EXIT_INVALID_KEY: i32 = 1;

/// The config command implementation.
pub struct ConfigCommand<'a> {
    store: &'a ConfigStore,
    args: ConfigArgs,
}

impl<'a> ConfigCommand<'a> {
    pub fn new(store: &'a ConfigStore, args: ConfigArgs) -> Self {
        Self { store, args }
    }

    fn list(&self, ui: &mut dyn UserInterface) -> CommandResult {
        ui.message(&format!("# {}", self.store.path().display()));
        for (key, value) in self.store.all_values() {
            ui.message(&format!("{} = {}", key, value));
        }
        CommandResult::success()
    }

    fn get(&self, key: &str, ui: &mut dyn UserInterface) -> CommandResult {
        if !ConfigStore::is_valid_key(key) {
            ui.error(&format!("Unknown configuration key: {}", key));
            return CommandResult::failure(EXIT_INVALID_KEY);
        }
        ui.message(&self.store.get_config_value(key, ""));
        CommandResult::success()
    }

    fn set(&self, key: &str, value: &str, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if let Err(e) = self.store.set_config_value(key, value) {
            ui.error(&e.to_string());
            return Ok(CommandResult::failure(EXIT_INVALID_KEY));
        }
        self.store.save()?;
        ui.success(&format!("{} = {}", key, value));
        Ok(CommandResult::success())
    }

    fn reset(&self, yes: bool, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if !yes && !ui.confirm("Reset all configuration values to their defaults?", false)? {
            ui.warning("Reset cancelled");
            return Ok(CommandResult::success());
        }
        self.store.reset_to_defaults();
        self.store.save()?;
        ui.success("Configuration reset to defaults");
        Ok(CommandResult::success())
    }
}

impl Command for ConfigCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &self.args.action {
            ConfigAction::List => Ok(self.list(ui)),
            ConfigAction::Get { key } => Ok(self.get(key, ui)),
            ConfigAction::Set { key, value } => self.set(key, value, ui),
            ConfigAction::Reset { yes } => self.reset(*yes, ui),
        }
    }
}
