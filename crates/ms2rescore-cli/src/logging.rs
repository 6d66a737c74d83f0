use crate::cli::LogLevel;
use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self},
    prelude::*,
};

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Critical | LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Builds the stderr layer and, when `log_file` is given, a file layer with thread ids.
pub fn build_subscriber(
    level: LogLevel,
    quiet: bool,
    log_file: Option<PathBuf>,
) -> Result<impl Subscriber + Send + Sync + 'static> {
    let console_filter = if quiet {
        LevelFilter::OFF
    } else {
        LevelFilter::from(level)
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(console_filter);

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true)
                    .with_filter(LevelFilter::from(level)),
            )
        }
        None => None,
    };

    Ok(tracing_subscriber::registry().with(stderr_layer).with(file_layer))
}

pub fn setup_logging(level: LogLevel, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    build_subscriber(level, quiet, log_file)?.init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, error, info, warn};

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Critical), LevelFilter::ERROR);
        assert_eq!(LevelFilter::from(LogLevel::Warning), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
    }

    #[test]
    fn file_layer_applies_the_chosen_level() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("ms2rescore.log");

        let subscriber = build_subscriber(LogLevel::Warning, true, Some(log_path.clone())).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            debug!("Debug message below the threshold.");
            info!("Info message below the threshold.");
            warn!("Warning message at the threshold.");
            error!("Error message above the threshold.");
        });

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(!content.contains("below the threshold"));
        assert!(content.contains("Warning message at the threshold."));
        assert!(content.contains("Error message above the threshold."));
        assert!(content.contains("WARN"));
        assert!(content.contains("ThreadId"));
    }

    #[test]
    fn critical_keeps_only_errors_in_the_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("ms2rescore.log");

        let subscriber = build_subscriber(LogLevel::Critical, true, Some(log_path.clone())).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            warn!("Dropped warning.");
            error!("Kept error.");
        });

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(!content.contains("Dropped warning."));
        assert!(content.contains("Kept error."));
    }

    #[test]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = build_subscriber(LogLevel::Info, false, Some(invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
