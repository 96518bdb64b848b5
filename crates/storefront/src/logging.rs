//! Logging context for scenario runs.
//!
//! Each scenario gets its own [`LogContext`], built when the scenario is
//! constructed and attached to the scenario future with
//! [`WithSubscriber`]. Nothing installs a process-wide subscriber, so two
//! scenarios in the same process can log at different levels.

use crate::result::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Minimum level a scenario logs at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Everything, including per-click detail
    Debug,
    /// Step progress
    #[default]
    Info,
    /// Suspicious but non-fatal conditions
    Warn,
    /// Failures only
    Error,
}

impl LogLevel {
    /// Level name as written in config and env
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Equivalent tracing filter
    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            other => Err(StoreError::Config {
                message: format!("unknown log level {other:?}"),
            }),
        }
    }
}

/// A subscriber scoped to one scenario
#[derive(Debug, Clone)]
pub struct LogContext {
    level: LogLevel,
    dispatch: Dispatch,
}

impl LogContext {
    /// Timestamped log lines on stderr, filtered at `level`
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self::with_writer(level, std::io::stderr)
    }

    /// Like [`LogContext::new`], but a `RUST_LOG` directive in the
    /// environment takes precedence over `level`
    #[must_use]
    pub fn from_env_or(level: LogLevel) -> Self {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(level.level_filter().into()));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
            .finish();
        Self {
            level,
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Log to a custom writer
    #[must_use]
    pub fn with_writer<W>(level: LogLevel, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level.level_filter())
            .with_writer(writer)
            .with_target(false)
            .with_ansi(false)
            .finish();
        Self {
            level,
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Configured minimum level
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// The underlying dispatcher
    #[must_use]
    pub const fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run `future` with this context as its subscriber
    pub fn scope<F: Future>(&self, future: F) -> WithDispatch<F> {
        future.with_subscriber(self.dispatch.clone())
    }
}

/// An error and its `source()` chain, joined with `: `
#[must_use]
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;
    use std::sync::{Arc, Mutex, PoisonError};
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink for assertions on emitted lines
    #[derive(Debug, Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedBuffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::SharedBuffer;
    use super::*;

    mod level_tests {
        use super::*;

        #[test]
        fn test_parse_levels() {
            assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
            assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
            assert_eq!(" Error ".parse::<LogLevel>().unwrap(), LogLevel::Error);
            assert!("verbose".parse::<LogLevel>().is_err());
        }

        #[test]
        fn test_ordering_matches_severity() {
            assert!(LogLevel::Debug < LogLevel::Info);
            assert!(LogLevel::Warn < LogLevel::Error);
            assert_eq!(LogLevel::default(), LogLevel::Info);
        }

        #[test]
        fn test_serde_uppercase() {
            let yaml = serde_yaml_ng::to_string(&LogLevel::Warn).unwrap();
            assert_eq!(yaml.trim(), "WARN");
        }
    }

    mod context_tests {
        use super::*;

        #[tokio::test]
        async fn test_scope_filters_by_level() {
            let buffer = SharedBuffer::default();
            let ctx = LogContext::with_writer(LogLevel::Warn, buffer.clone());

            ctx.scope(async {
                tracing::info!("hidden step");
                tracing::warn!("visible warning");
                tracing::error!(detail = "boom", "visible failure");
            })
            .await;

            let out = buffer.contents();
            assert!(!out.contains("hidden step"));
            assert!(out.contains("WARN"));
            assert!(out.contains("visible warning"));
            assert!(out.contains("detail=\"boom\""));
        }

        #[tokio::test]
        async fn test_contexts_are_independent() {
            let quiet = SharedBuffer::default();
            let loud = SharedBuffer::default();
            let quiet_ctx = LogContext::with_writer(LogLevel::Error, quiet.clone());
            let loud_ctx = LogContext::with_writer(LogLevel::Debug, loud.clone());

            quiet_ctx.scope(async { tracing::debug!("one") }).await;
            loud_ctx.scope(async { tracing::debug!("two") }).await;

            assert!(quiet.contents().is_empty());
            assert!(loud.contents().contains("two"));
            assert_eq!(loud_ctx.level(), LogLevel::Debug);
        }
    }

    #[test]
    fn test_error_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = StoreError::Io(io);
        assert_eq!(error_chain(&err), "I/O error: disk gone: disk gone");
        assert_eq!(error_chain(&StoreError::assertion("badge")), "Assertion failed: badge");
    }
}
