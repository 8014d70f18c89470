//! In-memory command registry for the device console.

use crate::app::commands::CommandSpec;
use crate::app::ports::CommandChannel;

#[derive(Debug, Default)]
pub struct CommandTable {
    entries: Vec<CommandSpec>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any registered command carries this name.
    pub fn knows(&self, command: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.command.eq_ignore_ascii_case(command))
    }

    /// One `NAME KEY=value: help` line per registration.
    pub fn help_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries
            .iter()
            .map(|e| format!("{} {}={}: {}", e.command, e.mux_key, e.mux_value, e.help))
    }
}

impl CommandChannel for CommandTable {
    fn register_mux_command(&mut self, spec: CommandSpec) {
        if self
            .entries
            .iter()
            .any(|e| e.command == spec.command && e.mux_value == spec.mux_value)
        {
            log::warn!("Command {} SENSOR={} already registered", spec.command, spec.mux_value);
            return;
        }
        self.entries.push(spec);
    }
}
