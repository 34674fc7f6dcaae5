//! Provisioning of the primary user account of a customized live image.

use std::process::ExitCode;

use clap::Parser;
use liveuser_common::logging::setup_logging;
use liveuser_provision::{
    Error,
    ErrorExitCode,
    LocalHost,
    ProvisionConfig,
    ProvisionReport,
    Provisioner,
    cli::Cli,
    ensure_root,
};

fn run_command(cli: Cli) -> Result<ProvisionReport, Error> {
    ensure_root()?;

    let config = ProvisionConfig::new_from_file(cli.config.as_deref())?;

    Provisioner::new(&LocalHost, &config, cli.output_mode()).provision(&cli.username, &cli.password)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = setup_logging(cli.verbosity.log_level_filter()) {
        let error = Error::from(error);
        eprintln!("{error}");
        return ErrorExitCode::from(error).into();
    }

    match run_command(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            ErrorExitCode::from(error).into()
        }
    }
}
