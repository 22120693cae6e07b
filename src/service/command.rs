//! A formatting service backed by an external in-place formatter.
//!
//! The formatter is a program that reformats the files named on its command
//! line in place, reads its options from `.cmake_format` in the working
//! directory, and prints its defaults with `--dump-config`. Each call runs in
//! a fresh scratch directory so calls never see each other's files.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use super::{BufferArena, FormatService, Handle, ReadySignal, ServiceError};

/// Formatter program used when none is configured.
pub const DEFAULT_PROGRAM: &str = "cmake-format-c";

const CONFIG_FILE_NAME: &str = ".cmake_format";
const SOURCE_FILE_NAME: &str = "input.cmake";
const DUMP_CONFIG_FLAG: &str = "--dump-config";
const PROBE_FLAG: &str = "--help";

/// How to invoke the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    /// Extra arguments, placed before the file name or mode flag of every call.
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn display_program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn command(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

/// [`FormatService`] that shells out to the formatter for every call.
#[derive(Debug)]
pub struct CommandService {
    spec: CommandSpec,
    arena: BufferArena,
}

impl CommandService {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            arena: BufferArena::new(),
        }
    }

    /// Probe the formatter on a background thread.
    ///
    /// The returned signal fires once: with the service when the program
    /// could be started, or with the spawn failure.
    pub fn launch(spec: CommandSpec) -> ReadySignal<Self> {
        ReadySignal::spawn(move || {
            let service = Self::new(spec);
            service.probe()?;
            Ok(service)
        })
    }

    pub const fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Buffers handed out and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.arena.live_count()
    }

    fn probe(&self) -> Result<(), ServiceError> {
        let dir = tempfile::tempdir()?;
        let output = self.run(self.spec.command(dir.path()).arg(PROBE_FLAG))?;
        tracing::debug!(
            program = %self.spec.display_program(),
            status = %output.status,
            "formatter probe finished"
        );
        Ok(())
    }

    fn run(&self, cmd: &mut Command) -> Result<Output, ServiceError> {
        let _scope = crate::perf::scope("service.command.run");
        cmd.output().map_err(|source| ServiceError::Spawn {
            program: self.spec.display_program(),
            source,
        })
    }

    fn declined(&self, op: &str, output: &Output) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(
            program = %self.spec.display_program(),
            status = %output.status,
            stderr = %stderr.trim(),
            "{op} produced no result"
        );
        crate::perf::log_event(
            "service.declined",
            format!("op={op} status={}", output.status),
        );
    }
}

impl FormatService for CommandService {
    fn default_config(&self) -> Result<Option<Handle>, ServiceError> {
        // An empty directory, so the dump shows built-in defaults rather than
        // whatever `.cmake_format` happens to sit in our own cwd.
        let dir = tempfile::tempdir()?;
        let output = self.run(self.spec.command(dir.path()).arg(DUMP_CONFIG_FLAG))?;
        if !output.status.success() || output.stdout.is_empty() {
            self.declined("default_config", &output);
            return Ok(None);
        }
        Ok(Some(self.arena.alloc(output.stdout)))
    }

    fn format(&self, source: &str, config: &str) -> Result<Option<Handle>, ServiceError> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE_NAME), config)?;
        let source_path = dir.path().join(SOURCE_FILE_NAME);
        fs::write(&source_path, source)?;

        let output = self.run(self.spec.command(dir.path()).arg(SOURCE_FILE_NAME))?;
        if !output.status.success() {
            self.declined("format", &output);
            return Ok(None);
        }
        let formatted = fs::read(&source_path)?;
        Ok(Some(self.arena.alloc(formatted)))
    }

    fn read(&self, handle: &Handle) -> Result<String, ServiceError> {
        self.arena.read(handle)
    }

    fn release(&self, handle: Handle) {
        if let Err(err) = self.arena.free(handle) {
            tracing::error!("formatter buffer release failed: {err}");
        }
    }
}
