use clap::{Parser, Subcommand};
use chrono::{DateTime, Local, Utc};
use bpswitch_common::{IpcClient, IpcCommand, IpcResponse, ErrorReporting, SwitchError};
use bpswitch_common::error::IpcError;

#[derive(Parser)]
#[command(name = "bpswitch-cli")]
#[command(about = "bpswitch-cli (Big Picture display switcher control)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pause window detection
    Pause,

    /// Resume window detection
    Resume,

    /// Toggle pause state
    TogglePause,

    /// Reload configuration
    Reload,

    /// Show current status
    Status,

    /// Restore desktop mode and stop the daemon
    Quit,
}

impl From<Commands> for IpcCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Pause => IpcCommand::Pause,
            Commands::Resume => IpcCommand::Resume,
            Commands::TogglePause => IpcCommand::TogglePause,
            Commands::Reload => IpcCommand::Reload,
            Commands::Status => IpcCommand::Status,
            Commands::Quit => IpcCommand::Quit,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = IpcClient::new();

    match client.send_command(cli.command.into()) {
        Ok(response) => print_response(response),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", SwitchError::Ipc(IpcError::Connection).user_friendly_message());
            std::process::exit(1);
        }
    }

    Ok(())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        let minutes = seconds / 60;
        let secs = seconds % 60;
        if secs == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m{}s", minutes, secs)
        }
    } else {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h{}m", hours, minutes)
        }
    }
}

fn format_last_switch(last_switch: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match last_switch {
        Some(at) => {
            let ago = (now - at).num_seconds().max(0) as u64;
            format!("{} ({} ago)", at.with_timezone(&Local).format("%H:%M:%S"), format_duration(ago))
        }
        None => "never".to_string(),
    }
}

fn print_response(response: IpcResponse) {
    match response {
        IpcResponse::Success { message } => {
            println!("✓ {}", message);
        }

        IpcResponse::Error { message } => {
            eprintln!("✗ Error: {}", message);
            std::process::exit(1);
        }

        IpcResponse::Status { detection_active, current_mode, session, last_switch } => {
            println!("bpswitch Status:");
            println!("================");
            println!("Mode:        {}", current_mode.map_or("Unknown".to_string(), |m| m.to_string()));
            println!("Detection:   {}", if detection_active { "Active" } else { "Paused" });
            println!("Session:     {}", session.map_or("Unknown".to_string(), |s| s.to_string()));
            println!("Last switch: {}", format_last_switch(last_switch, Utc::now()));
        }
    }
}
