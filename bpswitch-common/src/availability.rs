use crate::error::{SwitchError, SessionError};
use crate::session::DisplayTool;
use crate::Result;

pub const WINDOW_LIST_COMMAND: &str = "wmctrl";
pub const AUDIO_COMMAND: &str = "pactl";

/// Commands that must be on `PATH` before any mode is built.
pub fn required_commands(tool: DisplayTool) -> [&'static str; 3] {
    [AUDIO_COMMAND, WINDOW_LIST_COMMAND, tool.command()]
}

/// Fails if any of `commands` cannot be resolved on `PATH`, naming all of them.
pub fn ensure_available(commands: &[&str]) -> Result<()> {
    let missing: Vec<String> = commands
        .iter()
        .filter(|command| which::which(command).is_err())
        .map(|command| command.to_string())
        .collect();

    if missing.is_empty() {
        log::debug!("All required commands found: {:?}", commands);
        return Ok(());
    }

    for command in &missing {
        log::error!("The required command '{}' is not installed.", command);
    }
    Err(SwitchError::Session(SessionError::MissingCommands { commands: missing }))
}
