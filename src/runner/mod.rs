//! External stage execution.
//!
//! Every external tool (index builders and the stage scripts) runs through
//! [`StageRunner`]: a blocking subprocess call with an explicit working
//! directory, captured output and a caller-selected [`FailurePolicy`].

pub mod checkpoint;

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::error::Error;

pub use checkpoint::{ArtifactKind, PipelineArtifact};

/// What to do when a stage exits unsuccessfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return [`Error::Subprocess`]; the pipeline stops.
    #[default]
    Fatal,
    /// Log the failure and return `Ok(false)` to the caller.
    Report,
}

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    /// Human-readable stage name used in diagnostics.
    pub stage: String,
    pub program: OsString,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
}

impl StageCommand {
    pub fn new(
        stage: impl Into<String>,
        program: impl AsRef<OsStr>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            stage: stage.into(),
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Arguments as lossy strings, mostly for tests and logging.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for StageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs [`StageCommand`]s one at a time, blocking until each exits.
#[derive(Debug, Clone, Default)]
pub struct StageRunner {
    command_log: Option<PathBuf>,
}

impl StageRunner {
    pub fn new(command_log: Option<PathBuf>) -> Self {
        Self { command_log }
    }

    /// Run `cmd` to completion.
    ///
    /// Returns `Ok(true)` on success. On failure the command line and the
    /// captured stdout/stderr are logged; then `Fatal` returns
    /// [`Error::Subprocess`] and `Report` returns `Ok(false)`. A program that
    /// cannot be started counts as a failure.
    pub fn run(&self, cmd: &StageCommand, policy: FailurePolicy) -> Result<bool, Error> {
        log::info!("[{}] {}", cmd.stage, cmd);

        let result = Command::new(&cmd.program)
            .args(&cmd.args)
            .current_dir(&cmd.working_dir)
            .stdin(Stdio::null())
            .output();

        let (status, output) = match result {
            Ok(output) if output.status.success() => {
                log_output(log::Level::Debug, &cmd.stage, &output);
                self.append_log(cmd, Some(&output), None)?;
                return Ok(true);
            }
            Ok(output) => (output.status.to_string(), Some(output)),
            Err(e) => (format!("could not start: {e}"), None),
        };

        log::error!("{} failed ({}): {}", cmd.stage, status, cmd);
        if let Some(output) = &output {
            log_output(log::Level::Error, &cmd.stage, output);
        }
        self.append_log(cmd, output.as_ref(), Some(&status))?;

        match policy {
            FailurePolicy::Fatal => Err(Error::Subprocess {
                stage: cmd.stage.clone(),
                command: cmd.to_string(),
                status,
            }),
            FailurePolicy::Report => Ok(false),
        }
    }

    fn append_log(
        &self,
        cmd: &StageCommand,
        output: Option<&Output>,
        failure: Option<&str>,
    ) -> Result<(), Error> {
        let Some(path) = &self.command_log else {
            return Ok(());
        };
        write_log_entry(path, cmd, output, failure).map_err(|e| Error::io(e, path))
    }
}

fn write_log_entry(
    path: &Path,
    cmd: &StageCommand,
    output: Option<&Output>,
    failure: Option<&str>,
) -> std::io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{}", cmd)?;
    if let Some(output) = output {
        f.write_all(&output.stdout)?;
        f.write_all(&output.stderr)?;
    }
    if let Some(status) = failure {
        writeln!(f, "{} failed ({})", cmd.stage, status)?;
    }
    Ok(())
}

fn log_output(level: log::Level, stage: &str, output: &Output) {
    for (label, bytes) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_end();
        if !text.is_empty() {
            log::log!(level, "[{}] {}:\n{}", stage, label, text);
        }
    }
}
