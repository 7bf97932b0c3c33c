pub mod session;
pub mod availability;
pub mod command_builder;
pub mod executor;
pub mod window;
pub mod audio;
pub mod mode;
pub mod detection;
pub mod duration;
pub mod ipc;
pub mod error;

#[cfg(test)]
mod testing;

pub use session::{SessionKind, DisplayTool, detect_session, probe_display_tool};
pub use availability::{ensure_available, required_commands};
pub use command_builder::CommandBuilder;
pub use executor::{CommandOutput, CommandRunner, ProcessExecutor};
pub use audio::{AudioRouter, RetryPolicy};
pub use mode::{ModeController, ModeKind, SwitchSettings};
pub use detection::{DetectionLoop, DetectionStatus, LoopEvent, StatusSink};
pub use duration::parse_duration;
pub use ipc::{IpcClient, IpcServer, IpcCommand, IpcResponse};
pub use error::{SwitchError, Result, ErrorReporting};
