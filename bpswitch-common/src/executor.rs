use std::process::{Command, Stdio};
use crate::error::{SwitchError, ProcessError};
use crate::Result;

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turns a non-zero exit into a `ProcessError::NonZeroExit`.
    pub fn into_checked(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(SwitchError::Process(ProcessError::NonZeroExit {
                code: self.code.unwrap_or(-1),
                stderr: self.stderr,
            }))
        }
    }
}

/// Synchronous execution of an argument vector. All external tools run
/// through this.
pub trait CommandRunner {
    fn run(&self, argv: &[String]) -> Result<CommandOutput>;
}

#[derive(Clone, Debug, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessExecutor {
    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or(SwitchError::Process(ProcessError::EmptyCommand))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        log::debug!("Executing command: {:?}", argv);

        let output = cmd.output()
            .map_err(|e| SwitchError::Process(ProcessError::Execution {
                command: argv.join(" "),
                source: e,
            }))?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            log::warn!("{} exited with code {:?}: {}",
                program, result.code, result.stderr.trim());
        }

        Ok(result)
    }
}
