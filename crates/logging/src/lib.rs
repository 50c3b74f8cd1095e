#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Process-wide trace facility for the delta codec. Jobs emit diagnostics
//! through a single sink so embedders can route them into their own logging
//! without the library writing to stderr behind their back.
//!
//! The model is deliberately small: a severity [`TraceLevel`] (syslog-style,
//! nine levels), a process-wide minimum level, and a process-wide sink
//! function. The default sink writes to stderr. Both knobs should be set
//! before the first job starts and left alone; the sink is a plain `fn`
//! pointer, so dispatching through it is safe from any thread.
//!
//! # Examples
//!
//! ```
//! use logging::{TraceLevel, set_level, log_info};
//!
//! set_level(TraceLevel::Debug);
//! log_info!("loaded {} block signatures", 42);
//! ```
//!
//! With the `tracing` feature enabled, `tracing_sink` forwards every
//! message into the `tracing` ecosystem instead.

use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity levels, ordered from most to least urgent.
///
/// These match syslog severities with one extra `Trace` level below
/// `Debug` for per-command output.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum TraceLevel {
    /// System is unusable.
    Emerg = 0,
    /// Action must be taken immediately.
    Alert = 1,
    /// Critical conditions.
    Crit = 2,
    /// Error conditions.
    Error = 3,
    /// Warning conditions.
    Warning = 4,
    /// Normal but significant condition.
    Notice = 5,
    /// Informational.
    Info = 6,
    /// Debug-level messages.
    Debug = 7,
    /// Trace-level messages (per-command noise).
    Trace = 8,
}

impl TraceLevel {
    /// Short lowercase name used by the stderr sink.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Emerg => "emergency",
            Self::Alert => "alert",
            Self::Crit => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Emerg,
            1 => Self::Alert,
            2 => Self::Crit,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            7 => Self::Debug,
            8 => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback receiving formatted trace messages.
pub type TraceSink = fn(TraceLevel, &str);

static LEVEL: AtomicU8 = AtomicU8::new(TraceLevel::Info as u8);
static SINK: RwLock<TraceSink> = RwLock::new(stderr_sink);

/// Sets the least important severity that will reach the sink.
pub fn set_level(level: TraceLevel) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Returns the currently configured minimum severity.
#[must_use]
pub fn level() -> TraceLevel {
    TraceLevel::from_u8(LEVEL.load(Ordering::Relaxed))
}

/// Reports whether a message at `at` would currently be emitted.
#[must_use]
pub fn enabled(at: TraceLevel) -> bool {
    at <= level()
}

/// Replaces the process-wide trace sink.
pub fn set_sink(sink: TraceSink) {
    *SINK.write().unwrap_or_else(std::sync::PoisonError::into_inner) = sink;
}

/// Default sink: writes `oc-rdiff: <level>: <message>` to stderr.
///
/// Severities at `Notice` and below elide the level name, matching the
/// terse output users expect from command-line diagnostics.
pub fn stderr_sink(level: TraceLevel, msg: &str) {
    if level <= TraceLevel::Warning {
        eprintln!("oc-rdiff: {level}: {msg}");
    } else {
        eprintln!("oc-rdiff: {msg}");
    }
}

/// Formats and dispatches one message if `at` passes the level filter.
///
/// Prefer the [`log_error!`], [`log_warning!`], [`log_info!`],
/// [`log_debug!`] and [`log_trace!`] macros, which build the
/// [`fmt::Arguments`] lazily.
pub fn log(at: TraceLevel, args: fmt::Arguments<'_>) {
    if !enabled(at) {
        return;
    }
    let sink = *SINK.read().unwrap_or_else(std::sync::PoisonError::into_inner);
    sink(at, &args.to_string());
}

/// Logs at [`TraceLevel::Error`].
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::log($crate::TraceLevel::Error, format_args!($($arg)*))
    };
}

/// Logs at [`TraceLevel::Warning`].
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::log($crate::TraceLevel::Warning, format_args!($($arg)*))
    };
}

/// Logs at [`TraceLevel::Info`].
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::log($crate::TraceLevel::Info, format_args!($($arg)*))
    };
}

/// Logs at [`TraceLevel::Debug`].
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::log($crate::TraceLevel::Debug, format_args!($($arg)*))
    };
}

/// Logs at [`TraceLevel::Trace`].
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        $crate::log($crate::TraceLevel::Trace, format_args!($($arg)*))
    };
}

#[cfg(feature = "tracing")]
mod bridge {
    use super::TraceLevel;

    /// Sink that forwards messages into the `tracing` ecosystem.
    ///
    /// Install it with [`set_sink`](super::set_sink); the library-side level
    /// filter still applies before the event is created.
    pub fn tracing_sink(level: TraceLevel, msg: &str) {
        match level {
            TraceLevel::Emerg | TraceLevel::Alert | TraceLevel::Crit | TraceLevel::Error => {
                tracing::error!(target: "oc_rdiff", "{msg}");
            }
            TraceLevel::Warning => tracing::warn!(target: "oc_rdiff", "{msg}"),
            TraceLevel::Notice | TraceLevel::Info => tracing::info!(target: "oc_rdiff", "{msg}"),
            TraceLevel::Debug => tracing::debug!(target: "oc_rdiff", "{msg}"),
            TraceLevel::Trace => tracing::trace!(target: "oc_rdiff", "{msg}"),
        }
    }

    /// Installs a default `tracing-subscriber` honouring `RUST_LOG`.
    ///
    /// Convenience for binaries embedding the library; returns `false` when a
    /// global subscriber was already set.
    pub fn init_subscriber() -> bool {
        use tracing_subscriber::EnvFilter;

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init()
            .is_ok()
    }
}

#[cfg(feature = "tracing")]
pub use bridge::{init_subscriber, tracing_sink};
