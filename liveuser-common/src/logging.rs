//! Logging utilities.
//!
//! Provisioning usually runs unattended from a unit during image setup, in which case records go
//! to the systemd journal. Interactive runs log to stderr.

use log::{LevelFilter, Log};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use systemd_journal_logger::{JournalLog, connected_to_journal};

/// The syslog identifier used for journal records.
const SYSLOG_IDENTIFIER: &str = "liveuser";

/// Logging setup error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Logger initialization error.
    #[error("Logger initialization error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Sets up logging facilities.
///
/// Uses a [`JournalLog`] if the process is connected to the journal and a [`TermLogger`] on
/// stderr otherwise.
///
/// # Errors
///
/// An error is returned if a logger has already been set.
pub fn setup_logging(max_level: impl Into<LevelFilter>) -> Result<(), Error> {
    let max_level = max_level.into();

    if connected_to_journal()
        && let Ok(log) = JournalLog::new().map(|log| {
            Box::new(
                log.with_syslog_identifier(SYSLOG_IDENTIFIER.to_string())
                    .with_extra_fields(vec![("VERSION", env!("CARGO_PKG_VERSION"))]),
            ) as Box<dyn Log>
        })
    {
        log::set_boxed_logger(log)?;
        log::set_max_level(max_level);
        return Ok(());
    }

    // no timestamps on the terminal
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Trace)
        .build();

    // simplelog needs to be explicitly instructed to always use stderr
    TermLogger::init(max_level, config, TerminalMode::Stderr, ColorChoice::Auto)?;
    Ok(())
}
