use std::time::Duration;
use clap::Parser;
use log::{error, info};
use scale_weighin::cli::Cli;
use scale_weighin::{init_logging, run};
use scale_weighin::error::{AppRunError, ConfigError, SubmissionError};
use scale_weighin::weighin::form::WeighinField;

fn main() -> Result<(), AppRunError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!(concat!("Scale Weigh-in ", env!("CARGO_PKG_VERSION")));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| AppRunError::Runtime { source })?;

    let result = runtime.block_on(run(cli));
    // stdin reads may still be parked on the blocking pool
    runtime.shutdown_timeout(Duration::from_millis(250));

    match result {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            error!("Another weigh-in is already running");
            Ok(())
        },
        Err(AppRunError::SubmissionError { source: SubmissionError::Invalid { source } }) => {
            for field in WeighinField::all() {
                if let Some(field_error) = source.for_field(field) {
                    error!("{}", field_error);
                }
            }
            Err(AppRunError::SubmissionError { source: SubmissionError::Invalid { source } })
        },
        Err(err) => {
            error!("{}", err);
            Err(err)
        },
        Ok(_) => Ok(()),
    }
}
