use std::fmt;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use crate::audio::{AudioRouter, RetryPolicy};
use crate::command_builder::CommandBuilder;
use crate::executor::CommandRunner;
use crate::session::DisplayTool;

/// Audio attempts allowed for the Desktop fallback on exit.
const EXIT_AUDIO_ATTEMPTS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeKind {
    Game,
    Desktop,
}

impl ModeKind {
    pub fn other(self) -> Self {
        match self {
            ModeKind::Game => ModeKind::Desktop,
            ModeKind::Desktop => ModeKind::Game,
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::Game => write!(f, "Game Mode"),
            ModeKind::Desktop => write!(f, "Desktop Mode"),
        }
    }
}

/// One configuration snapshot, as consumed by the detection loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSettings {
    pub keywords: Vec<String>,
    pub poll_interval: Duration,
    pub display_tool: DisplayTool,
    pub game_screen: String,
    pub desktop_screen: String,
    pub game_audio: String,
    pub desktop_audio: String,
    pub audio_disabled: bool,
    pub audio_retry: RetryPolicy,
}

impl SwitchSettings {
    pub fn log_parameters(&self) {
        log::info!("PARAM: Detecting: {:?}", self.keywords);
        log::info!("PARAM: audio switching: {}", !self.audio_disabled);
        log::info!("PARAM: window check rate (ms): {}", self.poll_interval.as_millis());
        log::info!("PARAM: display tool: {}", self.display_tool);
        log::info!("PARAM: gamemode screen: {}", self.game_screen);
        log::info!("PARAM: desktop screen: {}", self.desktop_screen);
        log::info!("PARAM: gamemode audio output: {}", self.game_audio);
        log::info!("PARAM: desktop audio output: {}", self.desktop_audio);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeConfig {
    pub kind: ModeKind,
    pub screen_command: Vec<String>,
    pub audio_match: String,
    pub screen_name: String,
    pub audio_disabled: bool,
}

#[derive(Debug, Clone)]
pub struct Mode {
    config: ModeConfig,
    active: bool,
}

impl Mode {
    pub fn new(config: ModeConfig) -> Self {
        Self { config, active: false }
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Runs the screen command and, unless disabled, routes audio. Always
    /// executes, even when already active. The mode ends up active whatever
    /// the commands report.
    pub fn activate<R: CommandRunner + ?Sized>(&mut self, runner: &R, audio: &AudioRouter) {
        log::info!("Activating mode: {}", self.config.kind);
        self.switch_screen(runner);
        if !self.config.audio_disabled {
            if let Err(e) = audio.route_audio(runner, &self.config.audio_match) {
                log::warn!("Audio for {} not switched: {}", self.config.kind, e);
            }
        }
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    fn switch_screen<R: CommandRunner + ?Sized>(&self, runner: &R) {
        log::info!("Switching screen to: {} with command: {:?}",
            self.config.screen_name, self.config.screen_command);

        match runner.run(&self.config.screen_command) {
            Ok(output) if !output.success() => {
                log::warn!("Screen command for {} exited with {:?}: {}",
                    self.config.kind, output.code, output.stderr.trim());
            }
            Ok(_) => {}
            Err(e) => log::error!("Failed to run screen command for {}: {}", self.config.kind, e),
        }
    }
}

/// Owns the Game and Desktop modes built from one settings snapshot.
#[derive(Debug)]
pub struct ModeController {
    game: Mode,
    desktop: Mode,
    audio: AudioRouter,
}

impl ModeController {
    pub fn new(settings: &SwitchSettings, audio: AudioRouter) -> Self {
        let builder = CommandBuilder::new(settings.display_tool);

        let game = Mode::new(ModeConfig {
            kind: ModeKind::Game,
            screen_command: builder.build_screen_command(&settings.game_screen, &settings.desktop_screen),
            audio_match: settings.game_audio.clone(),
            screen_name: settings.game_screen.clone(),
            audio_disabled: settings.audio_disabled,
        });
        let desktop = Mode::new(ModeConfig {
            kind: ModeKind::Desktop,
            screen_command: builder.build_screen_command(&settings.desktop_screen, &settings.game_screen),
            audio_match: settings.desktop_audio.clone(),
            screen_name: settings.desktop_screen.clone(),
            audio_disabled: settings.audio_disabled,
        });

        Self { game, desktop, audio }
    }

    pub fn mode(&self, kind: ModeKind) -> &Mode {
        match kind {
            ModeKind::Game => &self.game,
            ModeKind::Desktop => &self.desktop,
        }
    }

    fn mode_mut(&mut self, kind: ModeKind) -> &mut Mode {
        match kind {
            ModeKind::Game => &mut self.game,
            ModeKind::Desktop => &mut self.desktop,
        }
    }

    pub fn is_active(&self, kind: ModeKind) -> bool {
        self.mode(kind).is_active()
    }

    pub fn current_mode(&self) -> Option<ModeKind> {
        if self.game.is_active() {
            Some(ModeKind::Game)
        } else if self.desktop.is_active() {
            Some(ModeKind::Desktop)
        } else {
            None
        }
    }

    /// Activates `target`, then deactivates the other mode.
    pub fn switch_to<R: CommandRunner + ?Sized>(&mut self, target: ModeKind, runner: &R) {
        let audio = self.audio.clone();
        self.mode_mut(target).activate(runner, &audio);
        self.mode_mut(target.other()).deactivate();
    }

    /// Exit fallback: brings Desktop back unless it is already active.
    /// Returns whether Desktop was activated.
    pub fn restore_desktop<R: CommandRunner + ?Sized>(&mut self, runner: &R) -> bool {
        if self.desktop.is_active() {
            log::info!("Desktop mode already active, nothing to restore");
            return false;
        }

        log::info!("Cleaning up and switching to desktop mode before exit.");
        let audio = AudioRouter::new(RetryPolicy::bounded(self.audio.policy().delay, EXIT_AUDIO_ATTEMPTS));
        self.desktop.activate(runner, &audio);
        self.game.deactivate();
        true
    }
}
