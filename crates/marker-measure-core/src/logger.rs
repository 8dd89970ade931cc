//! Process-wide log setup for the library crates and the CLI.
//!
//! [`LogSettings`] carries one level for the `marker_measure*` crates and a
//! quieter one for everything else (image decoders, font parsing). Plain
//! output goes to stderr as `+0.012s WARN  aruco: message`. With the
//! `tracing` feature, [`init_tracing`] installs a `tracing-subscriber` that
//! applies the same split as `EnvFilter` directives.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

const OWN_CRATES: [&str; 3] = ["marker_measure", "marker_measure_core", "marker_measure_aruco"];

/// Log levels for this workspace and for its dependencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogSettings {
    /// Records from the `marker_measure*` crates.
    pub level: LevelFilter,
    /// Records from any other target.
    pub dependencies: LevelFilter,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            dependencies: LevelFilter::Warn,
        }
    }
}

impl LogSettings {
    /// Workspace level from a name like `debug`; dependencies stay at `warn`
    /// unless that is louder than the requested level.
    pub fn from_name(name: &str) -> Self {
        let level = parse_level(name);
        Self {
            level,
            dependencies: level.min(LevelFilter::Warn),
        }
    }

    fn max_level(&self) -> LevelFilter {
        self.level.max(self.dependencies)
    }

    fn allows(&self, target: &str, level: Level) -> bool {
        let limit = if OWN_CRATES.contains(&crate_of(target)) {
            self.level
        } else {
            self.dependencies
        };
        level <= limit
    }

    /// The same settings as an `EnvFilter` directive string.
    pub fn directives(&self) -> String {
        let mut out = directive_name(self.dependencies).to_string();
        for krate in OWN_CRATES {
            out.push_str(&format!(",{krate}={}", directive_name(self.level)));
        }
        out
    }
}

fn directive_name(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

fn crate_of(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

/// `marker_measure_aruco::locate` prints as `aruco`.
fn component(target: &str) -> &str {
    let krate = crate_of(target);
    krate.strip_prefix("marker_measure_").unwrap_or(krate)
}

fn format_line(elapsed: Duration, level: Level, target: &str, args: &fmt::Arguments<'_>) -> String {
    format!(
        "+{:.3}s {:<5} {}: {}",
        elapsed.as_secs_f64(),
        level,
        component(target),
        args
    )
}

struct StderrLogger {
    settings: LogSettings,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.settings.allows(metadata.target(), metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first settings.
pub fn init(settings: LogSettings) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        settings,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(settings.max_level());
    Ok(())
}

/// [`init`] with `level` for this workspace and default dependency level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init(LogSettings {
        level,
        dependencies: level.min(LevelFilter::Warn),
    })
}

/// Parse a level name (`off`, `error`, ..., `trace`), falling back to `Info`.
pub fn parse_level(name: &str) -> LevelFilter {
    LevelFilter::from_str(name.trim()).unwrap_or(LevelFilter::Info)
}

/// Install a `tracing` subscriber; `RUST_LOG` overrides `settings`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, settings: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.directives()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder.compact().finish().try_init()
    };
}
