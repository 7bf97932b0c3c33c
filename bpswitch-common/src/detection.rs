use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tokio::sync::watch;
use crate::audio::AudioRouter;
use crate::executor::CommandRunner;
use crate::mode::{ModeController, ModeKind, SwitchSettings};
use crate::session::SessionKind;
use crate::window;

/// What the loop reports after each tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStatus {
    pub detection_active: bool,
    pub current_mode: Option<ModeKind>,
    pub session: Option<SessionKind>,
    pub last_switch: Option<DateTime<Utc>>,
}

impl DetectionStatus {
    pub fn new(detection_active: bool, session: Option<SessionKind>) -> Self {
        Self {
            detection_active,
            current_mode: None,
            session,
            last_switch: None,
        }
    }
}

/// Receives status updates from the loop. Delivery is fire-and-forget; only
/// the latest status matters.
pub trait StatusSink {
    fn publish(&self, status: &DetectionStatus);
}

impl StatusSink for watch::Sender<DetectionStatus> {
    fn publish(&self, status: &DetectionStatus) {
        self.send_if_modified(|current| {
            if current == status {
                return false;
            }
            log::debug!("Status changed: {:?}", status);
            *current = status.clone();
            true
        });
    }
}

#[derive(Debug)]
pub enum LoopEvent {
    /// Discard the current modes and rebuild them from these settings.
    Reload(Box<SwitchSettings>, SessionKind),
    Shutdown,
}

/// Polls window titles and keeps the Game/Desktop modes in line with what
/// is on screen. Runs on its own thread; one tick at a time.
pub struct DetectionLoop<R, S> {
    runner: R,
    sink: S,
    settings: SwitchSettings,
    session: SessionKind,
    enabled: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    controller: Option<ModeController>,
    /// Last mode pushed to the hardware. Survives reloads.
    last_applied: Option<ModeKind>,
    last_switch: Option<DateTime<Utc>>,
}

impl<R: CommandRunner, S: StatusSink> DetectionLoop<R, S> {
    pub fn new(
        runner: R,
        sink: S,
        settings: SwitchSettings,
        session: SessionKind,
        enabled: Arc<AtomicBool>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            runner,
            sink,
            settings,
            session,
            enabled,
            cancel,
            controller: None,
            last_applied: None,
            last_switch: None,
        }
    }

    pub fn controller(&self) -> Option<&ModeController> {
        self.controller.as_ref()
    }

    pub fn status(&self) -> DetectionStatus {
        DetectionStatus {
            detection_active: self.enabled.load(Ordering::SeqCst),
            current_mode: self.last_applied,
            session: Some(self.session),
            last_switch: self.last_switch,
        }
    }

    fn build_controller(&self) -> ModeController {
        log::info!("Building modes for {} session", self.session);
        self.settings.log_parameters();
        let audio = AudioRouter::new(self.settings.audio_retry).with_cancel(Arc::clone(&self.cancel));
        ModeController::new(&self.settings, audio)
    }

    /// One poll: classify the open windows and switch modes if needed, then
    /// publish the status. Does nothing but publish while paused.
    pub fn tick(&mut self) {
        if self.enabled.load(Ordering::SeqCst) {
            self.poll();
        }
        self.sink.publish(&self.status());
    }

    fn poll(&mut self) {
        let titles = match window::list_window_titles(&self.runner) {
            Ok(titles) => titles,
            Err(e) => {
                log::warn!("Could not list windows, skipping this check: {}", e);
                return;
            }
        };
        let visible = window::big_picture_visible(&self.settings.keywords, &titles);

        if self.controller.is_none() {
            self.controller = Some(self.build_controller());
        }
        let Some(controller) = self.controller.as_mut() else {
            return;
        };

        let target = if visible { ModeKind::Game } else { ModeKind::Desktop };
        if !controller.is_active(target) {
            log::info!("Big Picture {}; switching to {}",
                if visible { "detected" } else { "not detected" }, target);
            controller.switch_to(target, &self.runner);
            self.last_applied = Some(target);
            self.last_switch = Some(Utc::now());
        }
    }

    /// Replaces the settings; the modes are rebuilt on the next active tick.
    /// The last applied mode is kept so exit can still restore Desktop.
    pub fn reload(&mut self, settings: SwitchSettings, session: SessionKind) {
        log::info!("Configuration changed, discarding current modes");
        self.settings = settings;
        self.session = session;
        self.controller = None;
    }

    /// Exit fallback, run once when the loop stops. Restores Desktop unless
    /// it is known to be in place or nothing was ever switched.
    fn shutdown(mut self) {
        if self.controller.is_none() {
            match self.last_applied {
                Some(ModeKind::Game) => {
                    log::info!("Modes were discarded while in {}, rebuilding to restore desktop", ModeKind::Game);
                    self.controller = Some(self.build_controller());
                }
                Some(ModeKind::Desktop) => log::info!("Desktop mode already applied, nothing to restore"),
                None => log::info!("No modes were ever activated, nothing to restore"),
            }
        }

        if let Some(controller) = self.controller.as_mut() {
            if controller.restore_desktop(&self.runner) {
                self.last_applied = Some(ModeKind::Desktop);
                self.last_switch = Some(Utc::now());
            }
        }
        self.sink.publish(&self.status());
    }

    /// Ticks every poll interval until `Shutdown` arrives or every sender is
    /// gone, then restores Desktop mode.
    pub fn run(mut self, events: Receiver<LoopEvent>) {
        log::info!("Detection loop started (check rate {:?})", self.settings.poll_interval);
        loop {
            match events.recv_timeout(self.settings.poll_interval) {
                Err(RecvTimeoutError::Timeout) => self.tick(),
                Ok(LoopEvent::Reload(settings, session)) => self.reload(*settings, session),
                Ok(LoopEvent::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::info!("Detection loop stopping");
        self.shutdown();
    }
}
