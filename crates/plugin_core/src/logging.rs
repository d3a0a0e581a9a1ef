//! Process-wide structured logging.
//!
//! Records are JSON objects, one per line, written to standard error so that
//! standard output carries nothing but the result line. Install the subscriber
//! once at startup with [`init_logging`] (fatal on failure) or
//! [`LogConfig::try_init`]; tests and embedders can scope a subscriber built by
//! [`LogConfig::build_subscriber_with_writer`] instead.

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

pub const LOG_LEVEL_ENV: &str = "PLUGIN_LOG_LEVEL";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const LEVEL_CHOICES: &[&str] = &[
    "panic", "fatal", "error", "warn", "warning", "info", "debug", "trace",
];

#[derive(Debug, thiserror::Error)]
pub enum LogInitError {
    #[error("unknown log level: {level:?}. choices: {choices:?}")]
    UnknownLevel {
        level: String,
        choices: &'static [&'static str],
    },

    #[error("log has already been initialized")]
    AlreadyInitialized,
}

/// Maps a level name to a `tracing` level. `fatal` and `panic` collapse to
/// `error`, which is the most severe level `tracing` has.
pub fn parse_level(name: &str) -> Result<Level, LogInitError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "panic" | "fatal" | "error" => Ok(Level::ERROR),
        "warn" | "warning" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(LogInitError::UnknownLevel {
            level: name.to_string(),
            choices: LEVEL_CHOICES,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LogConfig {
    pub fn new(level: &str) -> Result<Self, LogInitError> {
        Ok(Self {
            level: parse_level(level)?,
        })
    }

    /// Reads the level from `PLUGIN_LOG_LEVEL`, defaulting to `info`.
    pub fn from_env() -> Result<Self, LogInitError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LogInitError> {
        let level = lookup(LOG_LEVEL_ENV).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Self::new(&level)
    }

    pub fn build_subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        self.build_subscriber_with_writer(std::io::stderr)
    }

    pub fn build_subscriber_with_writer<W>(
        &self,
        make_writer: W,
    ) -> impl Subscriber + Send + Sync + 'static
    where
        W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
    {
        tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_max_level(self.level)
            .with_writer(make_writer)
            .finish()
    }

    /// Installs the subscriber as the process-wide default.
    pub fn try_init(&self) -> Result<(), LogInitError> {
        tracing::subscriber::set_global_default(self.build_subscriber())
            .map_err(|_| LogInitError::AlreadyInitialized)
    }
}

/// Installs JSON logging at `level` or terminates the process.
///
/// Nothing else in a plugin can report failures without a logger, so an
/// unknown level or a second initialization exits with status 1.
pub fn init_logging(level: &str) {
    exit_on_error(LogConfig::new(level).and_then(|config| config.try_init()));
}

/// [`init_logging`] with the level taken from `PLUGIN_LOG_LEVEL`.
pub fn init_logging_from_env() {
    exit_on_error(LogConfig::from_env().and_then(|config| config.try_init()));
}

fn exit_on_error(outcome: Result<(), LogInitError>) {
    if let Err(error) = outcome {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use serde_json::Value;

    use super::*;

    #[derive(Clone, Default)]
    struct CapturedLines(Arc<Mutex<Vec<u8>>>);

    impl CapturedLines {
        fn records(&self) -> Vec<Value> {
            let bytes = self.0.lock().expect("poisoned mutex").clone();
            String::from_utf8(bytes)
                .expect("utf-8 log output")
                .lines()
                .map(|line| serde_json::from_str(line).expect("log line should be JSON"))
                .collect()
        }
    }

    impl io::Write for CapturedLines {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("poisoned mutex").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLines {
        type Writer = CapturedLines;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn parses_level_names_and_aliases() {
        assert_eq!(parse_level("info").expect("info"), Level::INFO);
        assert_eq!(parse_level("WARNING").expect("warning"), Level::WARN);
        assert_eq!(parse_level(" debug ").expect("debug"), Level::DEBUG);
        assert_eq!(parse_level("fatal").expect("fatal"), Level::ERROR);
        assert_eq!(parse_level("panic").expect("panic"), Level::ERROR);
        assert_eq!(parse_level("trace").expect("trace"), Level::TRACE);
    }

    #[test]
    fn rejects_unknown_level_with_choices() {
        let error = parse_level("verbose").expect_err("verbose is not a level");
        assert!(matches!(
            &error,
            LogInitError::UnknownLevel { level, choices }
                if level == "verbose" && choices.contains(&"info")
        ));
        assert!(error.to_string().starts_with("unknown log level: \"verbose\""));
    }

    #[test]
    fn level_comes_from_lookup_with_info_default() {
        assert_eq!(LogConfig::from_lookup(|_| None).expect("default"), LogConfig::default());

        let debug = LogConfig::from_lookup(|name| {
            (name == LOG_LEVEL_ENV).then(|| "debug".to_string())
        })
        .expect("debug");
        assert_eq!(debug.level, Level::DEBUG);

        assert!(matches!(
            LogConfig::from_lookup(|_| Some("loud".to_string())),
            Err(LogInitError::UnknownLevel { .. })
        ));
    }

    #[test]
    fn writes_flattened_json_records() {
        let captured = CapturedLines::default();
        let subscriber = LogConfig::new("info")
            .expect("valid level")
            .build_subscriber_with_writer(captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(plugin = "name_plugin", keys = 2, "plugin input parsed");
            tracing::debug!("filtered at info");
        });

        let records = captured.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "INFO");
        assert_eq!(records[0]["message"], "plugin input parsed");
        assert_eq!(records[0]["plugin"], "name_plugin");
        assert_eq!(records[0]["keys"], 2);
    }

    #[test]
    fn parsed_input_is_logged_as_json_at_debug() {
        let captured = CapturedLines::default();
        let subscriber = LogConfig::new("debug")
            .expect("valid level")
            .build_subscriber_with_writer(captured.clone());
        let schema = crate::ParamSchema::new(["first"], Vec::<String>::new());

        tracing::subscriber::with_default(subscriber, || {
            crate::parse_input(["test", r#"{"first": "Ada"}"#], &schema).expect("valid input");
        });

        let records = captured.records();
        let parsed = records
            .iter()
            .find(|record| record["message"] == "plugin input parsed")
            .expect("parse should log its input");
        assert_eq!(parsed["level"], "DEBUG");
        assert_eq!(parsed["provided_keys"], 1);
        assert_eq!(parsed["params"], r#"{"first":"Ada"}"#);
    }

    #[test]
    fn second_global_install_is_rejected() {
        let config = LogConfig::default();
        // The first install may lose to another test; the second always fails.
        let _ = config.try_init();
        assert!(matches!(
            config.try_init(),
            Err(LogInitError::AlreadyInitialized)
        ));
    }
}
