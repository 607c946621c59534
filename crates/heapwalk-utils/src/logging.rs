//! # Logging Utilities
//!
//! Logging infrastructure for heapwalk using `tracing`.
//!
//! Hosts embedding the detail resolver call one of the `init_*` functions once
//! at startup; the library crates only emit `tracing` events.
//!
//! - Pretty output for development, JSON for production
//! - Environment variable configuration
//! - Optional file sink, or file-only output for hosts whose stdout belongs to a UI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use heapwalk_utils::init_logging;
//!
//! // Reads RUST_LOG, HEAPWALK_LOG_FORMAT and HEAPWALK_LOG_FILE
//! init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Heap loaded");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=heapwalk_core=trace`)
//! - `HEAPWALK_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `HEAPWALK_LOG_FILE`: Optional path of an additional, daily-rolling log file

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::{env, fs, io};

use chrono::Utc;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "HEAPWALK_LOG_FORMAT";
/// Environment variable naming an additional log file.
pub const LOG_FILE_ENV: &str = "HEAPWALK_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the non-blocking file writers flushing for the life of the process.
static FILE_GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default for development)
    #[default]
    Pretty,
    /// JSON format (default for production)
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    /// Default
    Info,
    Debug,
    /// Most verbose; shows every provider dispatch
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Where and how to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig
{
    /// Explicit level. `None` defers to `RUST_LOG`, then `info`.
    pub level: Option<LogLevel>,
    pub format: LogFormat,
    /// Write to stdout
    pub console: bool,
    /// Also write to this file
    pub file: Option<PathBuf>,
    /// Roll the file daily instead of appending to one file forever
    pub rolling: bool,
}

impl Default for LoggingConfig
{
    fn default() -> Self
    {
        LoggingConfig {
            level: None,
            format: LogFormat::Pretty,
            console: true,
            file: None,
            rolling: true,
        }
    }
}

impl LoggingConfig
{
    /// Configuration from `HEAPWALK_LOG_FORMAT` and `HEAPWALK_LOG_FILE`.
    ///
    /// An unparseable format falls back to pretty output.
    #[must_use]
    pub fn from_env() -> Self
    {
        let format = env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|s| LogFormat::from_str(&s).ok())
            .unwrap_or_default();
        let file = env::var(LOG_FILE_ENV).ok().filter(|s| !s.is_empty()).map(PathBuf::from);

        LoggingConfig {
            format,
            file,
            ..Self::default()
        }
    }

    /// File-only output, for hosts that own stdout.
    #[must_use]
    pub fn file_only(path: impl Into<PathBuf>, level: Option<LogLevel>) -> Self
    {
        LoggingConfig {
            level,
            console: false,
            file: Some(path.into()),
            rolling: false,
            ..Self::default()
        }
    }

    /// Level filter: explicit level, else `RUST_LOG`, else `info`.
    fn env_filter(&self) -> EnvFilter
    {
        if let Some(level) = self.level {
            return EnvFilter::new(Level::from(level).to_string());
        }
        match env::var("RUST_LOG") {
            Ok(rust_log) => EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
            Err(_) => EnvFilter::new(Level::INFO.to_string()),
        }
    }
}

/// Initialize logging from the environment
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log file
/// cannot be created.
pub fn init_logging() -> Result<(), LoggingError>
{
    init_logging_with_config(&LoggingConfig::from_env())
}

/// Initialize console logging with explicit level and format
///
/// ```rust,no_run
/// use heapwalk_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// init_logging_with_level(LogLevel::Debug, LogFormat::Json).expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_logging_with_config(&LoggingConfig {
        level: Some(level),
        format,
        ..LoggingConfig::default()
    })
}

/// Initialize file-only logging
///
/// Used by hosts that render a UI on the terminal, so log lines do not
/// interfere with it. The parent directory is created if needed.
///
/// ## Errors
///
/// Returns an error if logging is already initialized, the path has no
/// file name or the directory cannot be created.
pub fn init_logging_to_file(path: impl Into<PathBuf>, level: Option<LogLevel>) -> Result<(), LoggingError>
{
    init_logging_with_config(&LoggingConfig::file_only(path, level))
}

/// Path of today's log file: `<directory>/YYYY-MM-DD-<name>.log`, date in UTC.
#[must_use]
pub fn dated_log_file(directory: impl AsRef<Path>, name: &str) -> PathBuf
{
    let today = Utc::now().format("%Y-%m-%d");
    directory.as_ref().join(format!("{today}-{name}.log"))
}

/// Initialize file-only logging to a dated file in the default location
///
/// The file is `~/.heapwalk/YYYY-MM-DD-heapwalk.log`, or the same name in the
/// system temp directory when `HOME` is not set. Returns the path used.
///
/// ```rust,no_run
/// use heapwalk_utils::{init_logging_to_default_file, LogLevel};
///
/// let path = init_logging_to_default_file(Some(LogLevel::Debug)).expect("Failed to initialize logging");
/// println!("logging to {}", path.display());
/// ```
///
/// ## Errors
///
/// Same as [`init_logging_to_file`].
pub fn init_logging_to_default_file(level: Option<LogLevel>) -> Result<PathBuf, LoggingError>
{
    let directory = match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".heapwalk"),
        None => env::temp_dir(),
    };
    let log_file = dated_log_file(directory, "heapwalk");
    init_logging_to_file(log_file.clone(), level)?;
    Ok(log_file)
}

/// Initialize logging from an explicit configuration
///
/// ## Errors
///
/// - `InvalidFile`: the configured file path has no file name
/// - `FileError`: the log directory cannot be created
/// - `InitializationFailed`: no sink is enabled, or a global subscriber is already set
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<(), LoggingError>
{
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if let Some(path) = &config.file {
        let file_name = path
            .file_name()
            .ok_or_else(|| LoggingError::InvalidFile(path.display().to_string()))?;
        let directory = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(directory)?;

        let appender = if config.rolling {
            rolling::daily(directory, file_name)
        } else {
            rolling::never(directory, file_name)
        };
        let (writer, worker) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(config.format, writer, false, config.env_filter()));
        guard = Some(worker);
    }
    if config.console {
        layers.push(format_layer(config.format, io::stdout, true, config.env_filter()));
    }
    if layers.is_empty() {
        return Err(LoggingError::InitializationFailed("no log sink configured".to_string()));
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    if let Some(worker) = guard {
        FILE_GUARDS
            .get_or_init(|| Mutex::new(Vec::new()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(worker);
    }
    Ok(())
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => layer.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// Log file path without a file name
    #[error("Invalid log file path: {0}")]
    InvalidFile(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
