use std::fmt;

use colored::Colorize;
use tracing::{Level, Subscriber};
use tracing_subscriber::FmtSubscriber;

use crate::colorize_bool;
use crate::organize::CollisionPolicy;

/// Folder name used when no format is configured.
pub const DEFAULT_FORMAT: &str = "{{release_name}} ({{release_date}})";

/// Audio file extensions opened by default.
pub const DEFAULT_EXTENSIONS: [&str; 8] = ["flac", "mp3", "m4a", "aif", "aiff", "wav", "ogg", "opus"];

/// Diagnostic log verbosity for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    #[default]
    Warn,
    Info,
    Debug,
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub auto: bool,
    pub debug: bool,
    pub dryrun: bool,
    pub verbose: bool,
    pub format: String,
    pub extensions: Vec<String>,
    pub collisions: CollisionPolicy,
    pub dest: Option<String>,
}

impl LogLevel {
    /// Debug wins over verbose.
    #[must_use]
    pub const fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Self::Debug
        } else if verbose {
            Self::Info
        } else {
            Self::Warn
        }
    }

    #[must_use]
    pub const fn as_level(self) -> Level {
        match self {
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
        }
    }

    /// Build a stderr log subscriber for this level.
    ///
    /// Meant for `tracing::subscriber::with_default` so the level only applies to one run.
    #[must_use]
    pub fn subscriber(self) -> impl Subscriber + Send + Sync + 'static {
        FmtSubscriber::builder()
            .with_max_level(self.as_level())
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish()
    }
}

impl Config {
    /// Log level derived from the `verbose` and `debug` flags.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        LogLevel::from_flags(self.verbose, self.debug)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto: false,
            debug: false,
            dryrun: false,
            verbose: false,
            format: DEFAULT_FORMAT.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            collisions: CollisionPolicy::default(),
            dest: None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_level())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "Config:".bold())?;
        writeln!(f, "  auto: {}", colorize_bool(self.auto))?;
        writeln!(f, "  debug: {}", colorize_bool(self.debug))?;
        writeln!(f, "  dryrun: {}", colorize_bool(self.dryrun))?;
        writeln!(f, "  verbose: {}", colorize_bool(self.verbose))?;
        writeln!(f, "  format: \"{}\"", self.format)?;
        writeln!(f, "  extensions: [{}]", self.extensions.join(", "))?;
        writeln!(f, "  collisions: {}", self.collisions)?;
        writeln!(f, "  dest: {}", self.dest.as_deref().unwrap_or("-"))?;
        write!(f, "  log level: {}", self.log_level())
    }
}
