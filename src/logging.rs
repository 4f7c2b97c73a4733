//! Human-readable log records for applications built on this crate.
//!
//! The library itself only emits [`tracing`] events. [`Logger`] builds a
//! subscriber that prints them as
//!
//! ```text
//! 2024-05-02 14:03:11,512 - INFO - geomcompare - wrote 12 feature(s)
//! ```
//!
//! and, when the level is `DEBUG` or more verbose,
//!
//! ```text
//! 2024-05-02 14:03:11,512 - DEBUG - geomcompare (PID: 4242) in geomcompare::vector::extract (l. 87) - entering layer #0
//! ```
//!
//! Both the level and the layout can be changed after installation with
//! [`Logger::reconfigure`].

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, Layer, Registry};

use crate::errors::Result;

type LevelLayer = reload::Layer<LevelFilter, Registry>;
type Leveled = Layered<LevelLayer, Registry>;
type FormatLayer = Box<dyn Layer<Leveled> + Send + Sync>;

/// Subscriber built by [`Logger::new`].
pub type LogSubscriber = Layered<reload::Layer<FormatLayer, Leveled>, Leveled>;

/// Where records are written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LogDestination {
    #[default]
    Stdout,
    Stderr,
    /// Appended to, created if missing.
    File(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// Shown in every record.
    pub name: String,
    /// `None` disables the output.
    pub level: Option<Level>,
    pub show_pid: bool,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            level: Some(Level::INFO),
            show_pid: false,
            destination: LogDestination::Stdout,
        }
    }
}

impl LogConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Option<Level>) -> Self {
        self.level = level;
        self
    }

    pub fn with_pid(mut self, show_pid: bool) -> Self {
        self.show_pid = show_pid;
        self
    }

    pub fn with_destination(mut self, destination: LogDestination) -> Self {
        self.destination = destination;
        self
    }

    fn level_filter(&self) -> LevelFilter {
        self.level.map_or(LevelFilter::OFF, LevelFilter::from_level)
    }

    fn verbose(&self) -> bool {
        self.level.is_some_and(|level| level >= Level::DEBUG)
    }

    fn make_writer(&self) -> Result<BoxMakeWriter> {
        Ok(match &self.destination {
            LogDestination::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogDestination::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogDestination::File(path) => {
                let file: File = OpenOptions::new().create(true).append(true).open(path)?;
                BoxMakeWriter::new(Mutex::new(file))
            }
        })
    }

    fn format_layer(&self) -> Result<FormatLayer> {
        let record = RecordFormat {
            name: self.name.clone(),
            pid: self.show_pid.then(std::process::id),
            verbose: self.verbose(),
        };
        Ok(tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .event_format(record)
            .with_writer(self.make_writer()?)
            .boxed())
    }
}

struct RecordFormat {
    name: String,
    pid: Option<u32>,
    verbose: bool,
}

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "{} - {} - {} ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            meta.level(),
            self.name
        )?;
        if let Some(pid) = self.pid {
            write!(writer, "(PID: {pid}) ")?;
        }
        if self.verbose {
            write!(
                writer,
                "in {} (l. {}) ",
                meta.module_path().unwrap_or_else(|| meta.target()),
                meta.line().unwrap_or_default()
            )?;
        }
        write!(writer, "- ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Handle on the level and layout of a [`LogSubscriber`].
pub struct Logger {
    config: LogConfig,
    level: reload::Handle<LevelFilter, Registry>,
    format: reload::Handle<FormatLayer, Leveled>,
}

impl Logger {
    /// Builds a subscriber for `config` and the handle reconfiguring it.
    ///
    /// The subscriber is not installed: pass it to [`Logger::install`] or
    /// scope it with `tracing::subscriber::with_default`.
    pub fn new(config: LogConfig) -> Result<(Self, LogSubscriber)> {
        let (level_layer, level) = reload::Layer::new(config.level_filter());
        let (format_layer, format) = reload::Layer::new(config.format_layer()?);
        let subscriber = tracing_subscriber::registry()
            .with(level_layer)
            .with(format_layer);
        let logger = Self {
            config,
            level,
            format,
        };
        Ok((logger, subscriber))
    }

    /// Builds the subscriber and sets it as the global default.
    pub fn install(config: LogConfig) -> Result<Self> {
        let (logger, subscriber) = Self::new(config)?;
        subscriber.try_init()?;
        Ok(logger)
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Swaps the level and the layout in place. Records keep going to a
    /// single output.
    pub fn reconfigure(&mut self, config: LogConfig) -> Result<()> {
        let format_layer = config.format_layer()?;
        self.format.reload(format_layer)?;
        self.level.reload(config.level_filter())?;
        self.config = config;
        Ok(())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("config", &self.config).finish()
    }
}
