//! livefmt - live-preview code formatting in the terminal.
//!
//! # Usage
//!
//! ```bash
//! livefmt CMakeLists.txt
//! livefmt --watch --config-file .cmake_format CMakeLists.txt
//! livefmt --print CMakeLists.txt > formatted.cmake
//! ```

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use livefmt::app::App;
use livefmt::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use livefmt::perf;
use livefmt::pipeline::{DEFAULT_DELAY_MS, Session, SessionOptions, SystemClock};
use livefmt::service::{CommandService, CommandSpec};

/// How long `--print` waits for the formatter to start.
const PRINT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Live-preview code formatter
#[derive(Parser, Debug)]
#[command(name = "livefmt", version, about, long_about = None)]
struct Cli {
    /// Source file to load into the source pane (stdin with --print)
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,

    /// Formatter config file to load into the config pane
    #[arg(long, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Formatter program; it must reformat the files it is given in place
    #[arg(long, value_name = "PROGRAM")]
    formatter: Option<String>,

    /// Extra argument for the formatter (repeatable)
    #[arg(long = "formatter-arg", value_name = "ARG", allow_hyphen_values = true)]
    formatter_args: Vec<String>,

    /// Quiet period after the last edit before reformatting
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Reformat at least this often while edits keep coming
    #[arg(long, value_name = "MS")]
    max_wait_ms: Option<u64>,

    /// Re-import loaded files when they change on disk
    #[arg(short, long)]
    watch: bool,

    /// Format once and print the result instead of starting the UI
    #[arg(long)]
    print: bool,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed debug events to a file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            formatter: self.formatter.clone(),
            formatter_args: self.formatter_args.clone(),
            debounce_ms: self.debounce_ms,
            max_wait_ms: self.max_wait_ms,
            watch: self.watch,
            perf: self.perf,
            debug_log: self.debug_log.clone(),
        }
    }
}

fn init_logging(interactive: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::WARN.into()),
    );
    // stderr is the UI's terminal while it runs
    if interactive {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}

fn read_source(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read source from stdin")?;
    Ok(text)
}

/// Headless mode: bootstrap, format once, print the output.
fn run_print(
    cli: &Cli,
    spec: CommandSpec,
    options: SessionOptions,
) -> Result<ExitCode> {
    let source = read_source(cli.source.as_deref())?;
    let config = cli
        .config_file
        .as_deref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .transpose()?;

    let service = CommandService::launch(spec)
        .wait(PRINT_READY_TIMEOUT)
        .context("Timed out waiting for the formatter to start")?
        .context("Formatter unavailable")?;

    let mut session = Session::new(Rc::new(SystemClock::new()), options);
    session.set_source(&source);
    let mut outcome = session.on_service_ready(service)?.initial_run.clone();
    if let Some(config) = config {
        session.set_config(&config);
        if let Some(rerun) = session.format_now() {
            outcome = rerun;
        }
    }

    let output = session.editor().output();
    if outcome.is_success() {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{output}");
        Ok(ExitCode::FAILURE)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(!cli.print);

    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("LIVEFMT_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize debug log {}: {}",
            debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    let spec = effective
        .formatter
        .as_deref()
        .map_or_else(CommandSpec::default, CommandSpec::new)
        .with_args(&effective.formatter_args);
    let options = SessionOptions {
        debounce_ms: effective.debounce_ms.unwrap_or(DEFAULT_DELAY_MS),
        max_wait_ms: effective.max_wait_ms,
    };

    if cli.print {
        return run_print(&cli, spec, options);
    }

    for path in [&cli.source, &cli.config_file].into_iter().flatten() {
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
    }

    let mut app = App::new()
        .with_source(cli.source)
        .with_config_file(cli.config_file)
        .with_options(options)
        .with_watch(effective.watch)
        .with_config_paths(
            Some(global_path),
            if local_path.exists() {
                Some(local_path)
            } else {
                None
            },
        );

    app.run(CommandService::launch(spec))
        .context("Application error")?;
    Ok(ExitCode::SUCCESS)
}
