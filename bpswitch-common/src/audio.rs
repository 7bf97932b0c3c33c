use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use crate::availability::AUDIO_COMMAND;
use crate::error::{SwitchError, AudioError};
use crate::executor::CommandRunner;
use crate::Result;

/// Failed attempts between two warnings while a sink is missing.
const WARN_EVERY: u32 = 20;

/// How long and how often to look for a sink before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(delay: Duration) -> Self {
        Self { delay, max_attempts: None }
    }

    pub fn bounded(delay: Duration, max_attempts: u32) -> Self {
        Self { delay, max_attempts: Some(max_attempts) }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_millis(500))
    }
}

/// Finds the `Name:` of the first sink block in a `pactl list sinks` dump
/// whose text contains `pattern`. Matching blocks without a name are skipped.
pub fn find_sink_name(dump: &str, pattern: &str) -> Option<String> {
    dump.split("\n\n")
        .filter(|block| block.contains(pattern))
        .find_map(|block| {
            let start = block.find("Name: ")? + "Name: ".len();
            let name = block[start..].lines().next().unwrap_or_default().trim();
            (!name.is_empty()).then(|| name.to_string())
        })
}

/// Sets the system default sink to the one whose description matches a
/// pattern, polling until it shows up.
#[derive(Debug, Clone, Default)]
pub struct AudioRouter {
    policy: RetryPolicy,
    cancel: Option<Arc<AtomicBool>>,
}

impl AudioRouter {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, cancel: None }
    }

    /// Stops retrying once `cancel` is set.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Returns the sink name that was made default.
    pub fn route_audio<R: CommandRunner + ?Sized>(&self, runner: &R, pattern: &str) -> Result<String> {
        let list = [AUDIO_COMMAND, "list", "sinks"].map(String::from);
        let mut attempts: u32 = 0;

        loop {
            if self.cancelled() {
                log::info!("Audio switch to {:?} cancelled after {} attempts", pattern, attempts);
                return Err(SwitchError::Audio(AudioError::Cancelled { pattern: pattern.to_string() }));
            }
            attempts += 1;

            let found = match runner.run(&list).and_then(|output| output.into_checked()) {
                Ok(output) => find_sink_name(&output.stdout, pattern),
                Err(e) => {
                    log::debug!("Listing audio sinks failed: {}", e);
                    None
                }
            };

            if let Some(sink) = found {
                log::info!("Switching audio to: {}", sink);
                let set_default = [AUDIO_COMMAND.to_string(), "set-default-sink".to_string(), sink.clone()];
                match runner.run(&set_default) {
                    Ok(output) if !output.success() => {
                        log::warn!("pactl set-default-sink {} exited with {:?}", sink, output.code);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("Failed to set default sink {}: {}", sink, e),
                }
                return Ok(sink);
            }

            if attempts == 1 || attempts % WARN_EVERY == 0 {
                log::warn!("No audio sink matching {:?} yet (attempt {})", pattern, attempts);
            } else {
                log::debug!("No audio sink matching {:?} (attempt {})", pattern, attempts);
            }

            if self.policy.max_attempts.is_some_and(|max| attempts >= max) {
                log::error!("Giving up on audio sink {:?} after {} attempts", pattern, attempts);
                return Err(SwitchError::Audio(AudioError::SinkNotFound {
                    pattern: pattern.to_string(),
                    attempts,
                }));
            }

            if !self.policy.delay.is_zero() {
                thread::sleep(self.policy.delay);
            }
        }
    }
}
