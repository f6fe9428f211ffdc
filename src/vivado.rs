//! # Vivado Invocation
//!
//! Runs Vivado in batch mode on one of the generated driver scripts and turns
//! its log into something readable:
//!
//! - task summaries (`synth_design: Time (s): cpu = ... ; elapsed = ...`) are
//!   condensed into a single [`TaskReport`] line,
//! - echoed script lines (`## ...`) are dropped,
//! - messages split over several lines (a line ending in `:`) are joined,
//! - every message is tagged with the [`Severity`] of its prefix.
//!
//! The call blocks until Vivado exits. No lock is held while it runs.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Executable used when none is configured.
pub const DEFAULT_EXECUTABLE: &str = "vivado";

/// A way to start Vivado, possibly with leading arguments
/// (e.g. `ssh build-host /opt/Xilinx/Vivado/2022.2/bin/vivado`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vivado {
    program: String,
    args: Vec<String>,
}

impl Vivado {
    /// Split a command line on whitespace.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| Error::ToolInvocation {
            command: command.to_string(),
            message: "the Vivado command is empty".to_string(),
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// The command running `script` in batch mode with `cwd` as working
    /// directory.
    pub fn batch(&self, script: &str, cwd: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(["-mode", "batch", "-source", script])
            .current_dir(cwd);
        command
    }

    /// Run `script` with Vivado's output passed straight through.
    pub fn run(&self, script: &str, cwd: &Path) -> Result<ExitStatus> {
        log::info!("running {} on {}", self, script);
        self.batch(script, cwd)
            .status()
            .map_err(|e| self.spawn_error(e))
    }

    /// Run `script`, handing every cleaned up log line to `on_line`.
    pub fn stream<F>(&self, script: &str, cwd: &Path, mut on_line: F) -> Result<ExitStatus>
    where
        F: FnMut(LogLine),
    {
        log::info!("running {} on {}", self, script);
        let mut child = self
            .batch(script, cwd)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut filter = LogFilter::default();
        let read = match child.stdout.take() {
            Some(stdout) => read_lines(stdout, |raw| {
                if let Some(line) = filter.feed(raw) {
                    on_line(line);
                }
            }),
            None => Ok(()),
        };
        // Reap the child even when its output could not be read.
        let status = child.wait()?;
        read?;
        if let Some(line) = filter.flush() {
            on_line(line);
        }
        Ok(status)
    }

    fn spawn_error(&self, error: std::io::Error) -> Error {
        Error::ToolInvocation {
            command: self.to_string(),
            message: error.to_string(),
        }
    }
}

/// Hand every line of `reader` to `on_line`. Vivado echoes file names in the
/// system encoding, so bytes that are not UTF-8 are replaced, not rejected.
fn read_lines<R, F>(reader: R, mut on_line: F) -> std::io::Result<()>
where
    R: Read,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        on_line(&String::from_utf8_lossy(&buf));
    }
}

impl fmt::Display for Vivado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Resource summary Vivado prints after every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: String,
    pub cpu: String,
    pub elapsed: String,
    pub peak: String,
    pub gain: String,
    pub free_physical: String,
    pub free_virtual: String,
}

fn report_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^(.+): Time \(s\): cpu = (.+?); elapsed = (.+?) \. Memory \(MB\): peak = (.+?) ; gain = (.+?) ; free physical = (.+?) ; free virtual = (.+?)$",
            )
            .ok()
        })
        .as_ref()
}

impl TaskReport {
    pub fn parse(line: &str) -> Option<Self> {
        let captures = report_pattern()?.captures(line)?;
        let group = |i: usize| captures[i].to_string();
        Some(Self {
            task: group(1),
            cpu: group(2),
            elapsed: group(3),
            peak: group(4),
            gain: group(5),
            free_physical: group(6),
            free_virtual: group(7),
        })
    }
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INFO: [vivamir::report] {} in {}s", self.task, self.elapsed)
    }
}

/// Severity of a log message, taken from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Plain,
    Info,
    Warning,
    /// `CRITICAL WARNING:` and `ERROR:`.
    Error,
}

impl Severity {
    pub fn of(line: &str) -> Self {
        if line.starts_with("CRITICAL WARNING: ") || line.starts_with("ERROR: ") {
            Severity::Error
        } else if line.starts_with("WARNING: ") {
            Severity::Warning
        } else if line.starts_with("INFO: ") {
            Severity::Info
        } else {
            Severity::Plain
        }
    }
}

/// One cleaned up unit of Vivado output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Report(TaskReport),
    Message { severity: Severity, text: String },
}

/// Line-by-line log cleaner.
#[derive(Debug, Default)]
pub struct LogFilter {
    pending: Option<(Severity, String)>,
}

impl LogFilter {
    /// Feed one raw line. Returns a line to show, if one is complete.
    pub fn feed(&mut self, raw: &str) -> Option<LogLine> {
        let line = raw.trim_end();
        if let Some(report) = TaskReport::parse(line) {
            return Some(LogLine::Report(report));
        }
        if line.starts_with("##") {
            return None;
        }
        let line = line.strip_prefix("# ").unwrap_or(line);

        let (severity, text) = match self.pending.take() {
            Some((severity, mut text)) => {
                text.push(' ');
                text.push_str(line.trim_start());
                (severity.max(Severity::of(line)), text)
            }
            None => (Severity::of(line), line.to_string()),
        };

        if text.ends_with(':') {
            self.pending = Some((severity, text));
            None
        } else {
            Some(LogLine::Message { severity, text })
        }
    }

    /// Return a message still waiting for its continuation.
    pub fn flush(&mut self) -> Option<LogLine> {
        self.pending
            .take()
            .map(|(severity, text)| LogLine::Message { severity, text })
    }
}
