use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bpswitch operations
#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Process execution error: {0}")]
    Process(#[from] ProcessError),

    #[error("Audio routing error: {0}")]
    Audio(#[from] AudioError),

    #[error("IPC error: {0}")]
    Ipc(#[from] IpcError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path:?}")]
    FileRead { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse TOML configuration: {message}")]
    TomlParse { message: String },

    #[error("Missing required configuration: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Graphical session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unsupported session type: {session_type:?} (desktop: {desktop:?})")]
    Unsupported { session_type: String, desktop: String },

    #[error("Required commands are not installed: {}", .commands.join(", "))]
    MissingCommands { commands: Vec<String> },
}

/// Process execution errors
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Command execution failed: {command:?}")]
    Execution { command: String, source: std::io::Error },

    #[error("Command returned non-zero exit code: {code}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Empty command line")]
    EmptyCommand,
}

/// Audio sink resolution errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio sink matching {pattern:?} after {attempts} attempts")]
    SinkNotFound { pattern: String, attempts: u32 },

    #[error("Audio routing cancelled while looking for {pattern:?}")]
    Cancelled { pattern: String },
}

/// IPC communication errors
#[derive(Error, Debug)]
pub enum IpcError {
    #[error("Another bpswitch daemon is already listening on {path:?}")]
    AlreadyRunning { path: PathBuf },

    #[error("Failed to connect to daemon")]
    Connection,

    #[error("Invalid IPC message format")]
    InvalidMessage,
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid duration: {duration}")]
    InvalidDuration { duration: String },
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, SwitchError>;

impl From<toml::de::Error> for SwitchError {
    fn from(err: toml::de::Error) -> Self {
        SwitchError::Config(ConfigError::TomlParse {
            message: err.to_string(),
        })
    }
}

// Error reporting utilities
pub trait ErrorReporting {
    fn log_error(&self, context: &str);
    fn user_friendly_message(&self) -> String;
}

impl ErrorReporting for SwitchError {
    fn log_error(&self, context: &str) {
        log::error!("{}: {:?}", context, self);
    }

    fn user_friendly_message(&self) -> String {
        match self {
            SwitchError::Config(ConfigError::FileRead { path, .. }) => {
                format!("Configuration file not found: {:?}", path)
            }
            SwitchError::Config(ConfigError::TomlParse { message }) => {
                format!("Invalid configuration format: {}", message)
            }
            SwitchError::Config(ConfigError::MissingField { field }) => {
                format!("Missing required setting '{}' in configuration file", field)
            }
            SwitchError::Session(SessionError::Unsupported { session_type, desktop }) => {
                format!(
                    "Unsupported graphical session (XDG_SESSION_TYPE={:?}, XDG_CURRENT_DESKTOP={:?}). \
                     Supported: X11, GNOME Wayland, KDE Plasma Wayland.",
                    session_type, desktop
                )
            }
            SwitchError::Session(SessionError::MissingCommands { commands }) => {
                format!(
                    "The required command(s) {} are not installed or not in PATH",
                    commands.join(", ")
                )
            }
            SwitchError::Ipc(IpcError::AlreadyRunning { .. }) => {
                "bpswitch daemon is already running.".to_string()
            }
            SwitchError::Ipc(IpcError::Connection) => {
                "bpswitch daemon is not running. Please start bpswitch-daemon first.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
