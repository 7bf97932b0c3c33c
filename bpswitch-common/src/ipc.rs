use std::path::PathBuf;
use std::os::unix::net::{UnixListener, UnixStream};
use std::io::{Read, Write};
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use anyhow::{Result, Context};
use crate::error::{SwitchError, IpcError};
use crate::mode::ModeKind;
use crate::session::SessionKind;

const SOCKET_NAME: &str = "bpswitch.sock";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpcCommand {
    Pause,
    Resume,
    TogglePause,
    Reload,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpcResponse {
    Success { message: String },
    Error { message: String },
    Status {
        detection_active: bool,
        current_mode: Option<ModeKind>,
        session: Option<SessionKind>,
        last_switch: Option<DateTime<Utc>>,
    },
}

/// `$XDG_RUNTIME_DIR/bpswitch.sock`, or `/run/user/<uid>/bpswitch.sock`
/// when the runtime dir is not set.
pub fn socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(|| {
            let uid = rustix::process::getuid().as_raw();
            PathBuf::from(format!("/run/user/{}", uid))
        })
        .join(SOCKET_NAME)
}

pub struct IpcClient {
    socket_path: PathBuf,
}

impl Default for IpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl IpcClient {
    pub fn new() -> Self {
        Self::with_path(socket_path())
    }

    pub fn with_path(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    pub fn send_command(&self, command: IpcCommand) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .with_context(|| format!("Failed to connect to bpswitch daemon at {:?}", self.socket_path))?;

        let command_json = serde_json::to_string(&command)
            .with_context(|| "Failed to serialize command")?;

        stream.write_all(command_json.as_bytes())
            .with_context(|| "Failed to send command to daemon")?;
        stream.shutdown(std::net::Shutdown::Write)
            .with_context(|| "Failed to shutdown write stream")?;

        let mut response = String::new();
        stream.read_to_string(&mut response)
            .with_context(|| "Failed to read response from daemon")?;

        let ipc_response: IpcResponse = serde_json::from_str(&response)
            .with_context(|| "Failed to deserialize response")?;

        Ok(ipc_response)
    }
}

pub struct IpcServer {
    socket_path: PathBuf,
}

impl Default for IpcServer {
    fn default() -> Self {
        Self::new()
    }
}

impl IpcServer {
    pub fn new() -> Self {
        Self::with_path(socket_path())
    }

    pub fn with_path(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    /// Claims the socket. Fails with `AlreadyRunning` if a live daemon
    /// answers on it; a stale socket file is removed.
    pub fn bind(&self) -> Result<UnixListener> {
        if self.socket_path.exists() {
            if UnixStream::connect(&self.socket_path).is_ok() {
                return Err(SwitchError::Ipc(IpcError::AlreadyRunning {
                    path: self.socket_path.clone(),
                })
                .into());
            }
            log::debug!("Removing stale socket {:?}", self.socket_path);
            std::fs::remove_file(&self.socket_path)
                .with_context(|| "Failed to remove existing socket")?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| "Failed to create socket directory")?;
        }

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind to socket {:?}", self.socket_path))?;

        log::info!("IPC server listening on {:?}", self.socket_path);
        Ok(listener)
    }

    /// Accepts connections forever, one thread per connection.
    pub fn serve<F>(listener: UnixListener, handler: F)
    where
        F: Fn(IpcCommand) -> Result<IpcResponse> + Send + Clone + 'static,
    {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let handler = handler.clone();
                    std::thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(stream, &handler) {
                            log::error!("Error handling IPC connection: {}", e);
                        }
                    });
                }
                Err(e) => {
                    log::error!("Error accepting IPC connection: {}", e);
                }
            }
        }
    }

    pub fn remove_socket(&self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            log::debug!("Could not remove socket {:?}: {}", self.socket_path, e);
        }
    }

    fn handle_connection<F>(mut stream: UnixStream, handler: &F) -> Result<()>
    where
        F: Fn(IpcCommand) -> Result<IpcResponse>,
    {
        let mut command_json = String::new();
        stream.read_to_string(&mut command_json)
            .with_context(|| "Failed to read command from client")?;

        let response = match serde_json::from_str::<IpcCommand>(&command_json) {
            Ok(command) => {
                log::debug!("IPC command: {:?}", command);
                handler(command).unwrap_or_else(|e| IpcResponse::Error { message: e.to_string() })
            }
            Err(e) => {
                log::warn!("Rejecting malformed IPC request: {}", e);
                IpcResponse::Error { message: IpcError::InvalidMessage.to_string() }
            }
        };

        let response_json = serde_json::to_string(&response)
            .with_context(|| "Failed to serialize response")?;

        stream.write_all(response_json.as_bytes())
            .with_context(|| "Failed to send response to client")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spawn_server(dir: &TempDir) -> PathBuf {
        let path = dir.path().join(SOCKET_NAME);
        let server = IpcServer::with_path(path.clone());
        let listener = server.bind().unwrap();
        std::thread::spawn(move || {
            IpcServer::serve(listener, |command| match command {
                IpcCommand::Status => Ok(IpcResponse::Status {
                    detection_active: true,
                    current_mode: Some(ModeKind::Game),
                    session: Some(SessionKind::X11),
                    last_switch: None,
                }),
                IpcCommand::Reload => anyhow::bail!("config broken"),
                other => Ok(IpcResponse::Success { message: format!("{:?}", other) }),
            });
        });
        path
    }

    #[test]
    fn test_client_server_exchange() {
        let dir = TempDir::new().unwrap();
        let client = IpcClient::with_path(spawn_server(&dir));

        assert_eq!(
            client.send_command(IpcCommand::Pause).unwrap(),
            IpcResponse::Success { message: "Pause".to_string() }
        );
        match client.send_command(IpcCommand::Status).unwrap() {
            IpcResponse::Status { current_mode, session, .. } => {
                assert_eq!(current_mode, Some(ModeKind::Game));
                assert_eq!(session, Some(SessionKind::X11));
            }
            other => panic!("Expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_handler_error_becomes_error_response() {
        let dir = TempDir::new().unwrap();
        let client = IpcClient::with_path(spawn_server(&dir));

        assert_eq!(
            client.send_command(IpcCommand::Reload).unwrap(),
            IpcResponse::Error { message: "config broken".to_string() }
        );
    }

    #[test]
    fn test_second_daemon_refused() {
        let dir = TempDir::new().unwrap();
        let path = spawn_server(&dir);

        let err = IpcServer::with_path(path).bind().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SwitchError>(),
            Some(SwitchError::Ipc(IpcError::AlreadyRunning { .. }))
        ));
    }

    #[test]
    fn test_stale_socket_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SOCKET_NAME);
        drop(UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let listener = IpcServer::with_path(path.clone()).bind();

        assert!(listener.is_ok());
    }

    #[test]
    fn test_client_without_daemon_fails() {
        let dir = TempDir::new().unwrap();
        let client = IpcClient::with_path(dir.path().join(SOCKET_NAME));
        assert!(client.send_command(IpcCommand::Status).is_err());
    }
}
