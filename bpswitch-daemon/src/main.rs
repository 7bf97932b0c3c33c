use anyhow::{Context, Result};
use clap::Parser;
use bpswitch_config::Config;
use bpswitch_common::{
    DetectionLoop, DetectionStatus, LoopEvent, ProcessExecutor, IpcServer, IpcCommand, IpcResponse,
    DisplayTool, SessionKind, ErrorReporting, ensure_available, probe_display_tool, required_commands,
};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{watch, Notify};

#[derive(Parser, Debug)]
#[command(name = "bpswitch-daemon")]
#[command(about = "Switches display and audio when Steam Big Picture is open")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with detection paused
    #[arg(long)]
    paused: bool,
}

/// Everything that must hold before modes can be built.
struct Preflight {
    config: Config,
    session: SessionKind,
    tool: DisplayTool,
}

fn preflight(config_path: &Path) -> bpswitch_common::Result<Preflight> {
    let config = Config::load_from_path(config_path)?;
    let (session, tool) = probe_display_tool()?;
    ensure_available(&required_commands(tool))?;
    Ok(Preflight { config, session, tool })
}

/// Shared between the IPC connection threads.
struct IpcContext {
    config_path: PathBuf,
    enabled: Arc<AtomicBool>,
    status: watch::Receiver<DetectionStatus>,
    events: Mutex<mpsc::Sender<LoopEvent>>,
    quit: Arc<Notify>,
}

fn handle_ipc_command(command: IpcCommand, ctx: &IpcContext) -> IpcResponse {
    match command {
        IpcCommand::Pause => {
            ctx.enabled.store(false, Ordering::SeqCst);
            log::info!("Detection paused");
            IpcResponse::Success { message: "Detection paused".to_string() }
        }

        IpcCommand::Resume => {
            ctx.enabled.store(true, Ordering::SeqCst);
            log::info!("Detection resumed");
            IpcResponse::Success { message: "Detection resumed".to_string() }
        }

        IpcCommand::TogglePause => {
            let was_enabled = ctx.enabled.fetch_xor(true, Ordering::SeqCst);
            let status = if was_enabled { "paused" } else { "resumed" };
            log::info!("Detection {}", status);
            IpcResponse::Success { message: format!("Detection {}", status) }
        }

        IpcCommand::Reload => match preflight(&ctx.config_path) {
            Ok(Preflight { config, session, tool }) => {
                let event = LoopEvent::Reload(Box::new(config.switch_settings(tool)), session);
                match ctx.events.lock().unwrap().send(event) {
                    Ok(()) => IpcResponse::Success { message: "Configuration reloaded".to_string() },
                    Err(_) => IpcResponse::Error { message: "Detection loop is not running".to_string() },
                }
            }
            Err(e) => {
                e.log_error("Reload failed, keeping current configuration");
                IpcResponse::Error {
                    message: format!("Reload failed: {}", e.user_friendly_message()),
                }
            }
        },

        IpcCommand::Status => {
            let status = ctx.status.borrow().clone();
            IpcResponse::Status {
                detection_active: ctx.enabled.load(Ordering::SeqCst),
                current_mode: status.current_mode,
                session: status.session,
                last_switch: status.last_switch,
            }
        }

        IpcCommand::Quit => {
            log::info!("Quit requested over IPC");
            ctx.quit.notify_one();
            IpcResponse::Success { message: "Shutting down".to_string() }
        }
    }
}

async fn listen_for_shutdown(quit: &Notify) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for SIGINT")?;
            log::info!("Received SIGINT");
        }
        _ = sigterm.recv() => log::info!("Received SIGTERM"),
        _ = sighup.recv() => log::info!("Received SIGHUP"),
        _ = quit.notified() => {}
    }
    Ok(())
}

/// Returns once a signal or an IPC quit arrives. A failure to listen for
/// signals counts as a shutdown request.
async fn wait_for_shutdown(quit: &Notify) {
    if let Err(e) = listen_for_shutdown(quit).await {
        log::error!("Signal handling failed, shutting down: {:#}", e);
    }
}

/// Stops the detection loop and waits for its Desktop fallback to finish.
fn stop_detection(cancel: &AtomicBool, events: &mpsc::Sender<LoopEvent>, detection_thread: JoinHandle<()>) {
    cancel.store(true, Ordering::SeqCst);
    if events.send(LoopEvent::Shutdown).is_err() {
        log::warn!("Detection loop already stopped");
    }
    if detection_thread.join().is_err() {
        log::error!("Detection thread panicked");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    log::info!("Starting bpswitch daemon...");

    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e.user_friendly_message()))?,
    };

    let Preflight { config, session, tool } = preflight(&config_path)
        .map_err(|e| {
            log::error!("Startup check failed: {}", e.user_friendly_message());
            anyhow::anyhow!("Startup check failed: {}", e.user_friendly_message())
        })?;

    log::info!("Configuration loaded successfully");

    let server = IpcServer::new();
    let listener = server.bind()?;

    let start_paused = args.paused || config.detection.start_paused;
    if start_paused {
        log::info!("Starting with detection paused");
    }
    let enabled = Arc::new(AtomicBool::new(!start_paused));
    let cancel = Arc::new(AtomicBool::new(false));
    let (status_tx, status_rx) = watch::channel(DetectionStatus::new(!start_paused, Some(session)));
    let (events_tx, events_rx) = mpsc::channel();

    let detection = DetectionLoop::new(
        ProcessExecutor::new(),
        status_tx,
        config.switch_settings(tool),
        session,
        Arc::clone(&enabled),
        Arc::clone(&cancel),
    );
    let detection_thread = std::thread::Builder::new()
        .name("detection".to_string())
        .spawn(move || detection.run(events_rx))
        .context("Failed to spawn detection thread")?;

    let quit = Arc::new(Notify::new());
    let ctx = Arc::new(IpcContext {
        config_path,
        enabled,
        status: status_rx,
        events: Mutex::new(events_tx.clone()),
        quit: Arc::clone(&quit),
    });

    std::thread::spawn(move || {
        IpcServer::serve(listener, move |cmd| Ok(handle_ipc_command(cmd, &ctx)));
    });

    log::info!("Daemon started successfully");

    wait_for_shutdown(&quit).await;

    log::info!("Shutting down...");
    tokio::task::spawn_blocking(move || stop_detection(&cancel, &events_tx, detection_thread))
        .await
        .context("Failed to wait for detection thread")?;

    server.remove_socket();
    log::info!("bpswitch daemon stopped");
    Ok(())
}
