//! Scripted `CommandRunner` shared by the unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::audio::RetryPolicy;
use crate::error::{SwitchError, ProcessError};
use crate::executor::{CommandOutput, CommandRunner};
use crate::mode::SwitchSettings;
use crate::session::DisplayTool;
use crate::Result;

#[derive(Default)]
struct Script {
    windows: String,
    windows_fail: bool,
    sink_dumps: Vec<String>,
    screen_code: i32,
    calls: Vec<Vec<String>>,
}

/// Answers `wmctrl -l` and `pactl list sinks` from canned text, succeeds for
/// everything else, and records every argv it sees. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_windows(&self, titles: &[&str]) {
        let text = titles
            .iter()
            .enumerate()
            .map(|(i, title)| format!("0x0{}0000a  0 myhost {}\n", i, title))
            .collect();
        let mut script = self.script.lock().unwrap();
        script.windows = text;
        script.windows_fail = false;
    }

    pub fn fail_windows(&self) {
        self.script.lock().unwrap().windows_fail = true;
    }

    /// Each `pactl list sinks` consumes one dump; the last one repeats.
    pub fn set_sink_dumps(&self, dumps: &[&str]) {
        self.script.lock().unwrap().sink_dumps = dumps.iter().map(|d| d.to_string()).collect();
    }

    pub fn set_screen_exit_code(&self, code: i32) {
        self.script.lock().unwrap().screen_code = code;
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|argv| argv.first().map(String::as_str) == Some(program))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.script.lock().unwrap().calls.clear();
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(argv.to_vec());

        let args: Vec<&str> = argv.iter().map(String::as_str).collect();
        let ok = |stdout: String| CommandOutput { code: Some(0), stdout, stderr: String::new() };

        match args.as_slice() {
            ["wmctrl", "-l"] if script.windows_fail => {
                Err(SwitchError::Process(ProcessError::Execution {
                    command: "wmctrl -l".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
                }))
            }
            ["wmctrl", "-l"] => Ok(ok(script.windows.clone())),
            ["pactl", "list", "sinks"] => {
                let dump = if script.sink_dumps.len() > 1 {
                    script.sink_dumps.remove(0)
                } else {
                    script.sink_dumps.first().cloned().unwrap_or_default()
                };
                Ok(ok(dump))
            }
            ["pactl", ..] => Ok(ok(String::new())),
            _ => Ok(CommandOutput {
                code: Some(script.screen_code),
                stdout: String::new(),
                stderr: String::new(),
            }),
        }
    }
}

pub const TWO_SINKS: &str = "Sink #0\n\
\tState: SUSPENDED\n\
\tName: alsa_output.pci-0000_01_00.1.hdmi-stereo\n\
\tDescription: HDA NVidia Digital Stereo (HDMI)\n\
\tDriver: PipeWire\n\
\n\
Sink #1\n\
\tState: RUNNING\n\
\tName: alsa_output.pci-0000_00_1f.3.analog-stereo\n\
\tDescription: Built-in Audio Analog Stereo\n\
\tDriver: PipeWire\n";

/// HDMI-1/"HDMI" for Game, eDP-1/"Built-in Audio" for Desktop, three audio
/// attempts with no delay.
pub fn sample_settings(tool: DisplayTool) -> SwitchSettings {
    SwitchSettings {
        keywords: vec!["Steam".to_string(), "Big".to_string(), "Picture".to_string()],
        poll_interval: Duration::from_millis(1000),
        display_tool: tool,
        game_screen: "HDMI-1".to_string(),
        desktop_screen: "eDP-1".to_string(),
        game_audio: "HDMI".to_string(),
        desktop_audio: "Built-in Audio".to_string(),
        audio_disabled: false,
        audio_retry: RetryPolicy::bounded(Duration::ZERO, 3),
    }
}
