//! Test logging infrastructure for lifecycle and scope tests.
//!
//! Captures typed events — lifecycle emissions, resolution attempts, handle
//! completions, cancellations — with timestamps, so a failing test can
//! report exactly what the engine observed and in what order.
//!
//! # Example
//!
//! ```ignore
//! use scopebind::test_logging::{ScopeTestLogger, TestEvent, TestLogLevel};
//!
//! let logger = ScopeTestLogger::new(TestLogLevel::Debug);
//! logger.log(TestEvent::EventEmitted { event: "Create".into() });
//!
//! // On test completion, print the report
//! println!("{}", logger.report());
//! ```

use std::fmt::Write as _;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Logging verbosity level for tests.
///
/// Levels are ordered from least to most verbose:
/// `Error < Warn < Info < Debug < Trace`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TestLogLevel {
    /// Only errors and failures.
    Error,
    /// Warnings and above.
    Warn,
    /// General test progress.
    #[default]
    Info,
    /// Resolution and delivery detail.
    Debug,
    /// Everything, including each poll outcome.
    Trace,
}

impl TestLogLevel {
    /// Returns a human-readable name for the level.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    /// Returns the level from the `TEST_LOG_LEVEL` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("TEST_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for TestLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TestLogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

/// A typed event captured by the test logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestEvent {
    /// A lifecycle event was emitted on the owner's channel.
    EventEmitted {
        /// Debug rendering of the event.
        event: String,
    },
    /// A last-known state was synthesized from an owner tracker.
    BackfillRecorded {
        /// Debug rendering of the synthesized event.
        event: String,
    },
    /// A literal duplicate of a backfilled event was suppressed.
    DuplicateSuppressed {
        /// Debug rendering of the suppressed event.
        event: String,
    },
    /// A scope was requested.
    ScopeRequested {
        /// Debug rendering of the last-known state at request time.
        last_known: String,
    },
    /// A scope handle fired "done".
    ScopeResolved,
    /// A scope request or handle surfaced an error.
    ScopeFailed {
        /// Display rendering of the error.
        error: String,
    },
    /// A scope handle was cancelled.
    HandleCancelled,
    /// Free-form event for test-specific logging.
    Custom {
        /// Category tag.
        category: &'static str,
        /// Message text.
        message: String,
    },
}

impl TestEvent {
    /// The minimum level at which this event is captured.
    #[must_use]
    pub fn level(&self) -> TestLogLevel {
        match self {
            Self::ScopeFailed { .. } => TestLogLevel::Warn,
            Self::ScopeRequested { .. } | Self::ScopeResolved | Self::HandleCancelled => {
                TestLogLevel::Info
            }
            Self::EventEmitted { .. }
            | Self::BackfillRecorded { .. }
            | Self::DuplicateSuppressed { .. } => TestLogLevel::Debug,
            Self::Custom { .. } => TestLogLevel::Info,
        }
    }

    /// Short category tag for report grouping.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::EventEmitted { .. } => "emit",
            Self::BackfillRecorded { .. } => "backfill",
            Self::DuplicateSuppressed { .. } => "dedupe",
            Self::ScopeRequested { .. } => "request",
            Self::ScopeResolved => "resolve",
            Self::ScopeFailed { .. } => "fail",
            Self::HandleCancelled => "cancel",
            Self::Custom { category, .. } => category,
        }
    }
}

/// A captured event with its elapsed-time stamp.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Time since the logger was created.
    pub elapsed: Duration,
    /// The captured event.
    pub event: TestEvent,
}

/// Captures and reports typed test events with timestamps.
#[derive(Debug)]
pub struct ScopeTestLogger {
    level: TestLogLevel,
    events: Mutex<Vec<LogRecord>>,
    start_time: Instant,
}

impl ScopeTestLogger {
    /// Creates a logger capturing events at or below `level`.
    #[must_use]
    pub fn new(level: TestLogLevel) -> Self {
        Self {
            level,
            events: Mutex::new(Vec::new()),
            start_time: Instant::now(),
        }
    }

    /// Creates a logger with the level from `TEST_LOG_LEVEL`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(TestLogLevel::from_env())
    }

    /// The capture level.
    #[must_use]
    pub fn level(&self) -> TestLogLevel {
        self.level
    }

    /// Time since the logger was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Captures an event if its level is within the capture level.
    pub fn log(&self, event: TestEvent) {
        if event.level() > self.level {
            return;
        }
        let record = LogRecord {
            elapsed: self.start_time.elapsed(),
            event,
        };
        self.events.lock().expect("logger poisoned").push(record);
    }

    /// Captures a free-form event.
    pub fn custom(&self, category: &'static str, message: impl Into<String>) {
        self.log(TestEvent::Custom {
            category,
            message: message.into(),
        });
    }

    /// Number of captured events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.lock().expect("logger poisoned").len()
    }

    /// Snapshot of the captured events.
    #[must_use]
    pub fn events(&self) -> Vec<LogRecord> {
        self.events.lock().expect("logger poisoned").clone()
    }

    /// Returns the captured categories in capture order.
    #[must_use]
    pub fn categories(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("logger poisoned")
            .iter()
            .map(|record| record.event.category())
            .collect()
    }

    /// Renders a timestamped report of every captured event.
    #[must_use]
    pub fn report(&self) -> String {
        let events = self.events.lock().expect("logger poisoned");
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== scope test log ({} events, {:?} elapsed) ===",
            events.len(),
            self.start_time.elapsed()
        );
        for record in events.iter() {
            let _ = writeln!(
                out,
                "[{:>10.3?}] {:<9} {:?}",
                record.elapsed,
                record.event.category(),
                record.event
            );
        }
        out
    }

    /// Panics if any `ScopeFailed` event was captured.
    pub fn assert_no_failures(&self) {
        let events = self.events.lock().expect("logger poisoned");
        let failures: Vec<_> = events
            .iter()
            .filter(|record| matches!(record.event, TestEvent::ScopeFailed { .. }))
            .collect();
        assert!(
            failures.is_empty(),
            "captured {} scope failure(s): {failures:?}",
            failures.len()
        );
    }

    /// Discards all captured events.
    pub fn clear(&self) {
        self.events.lock().expect("logger poisoned").clear();
    }
}
