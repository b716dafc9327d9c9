use std::env;
use std::io;
use std::path::{Path, PathBuf};
use log::{info, warn};
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::cli::{Cli, Command, ManualArgs, ProfileArgs, ScanArgs};
use crate::config::io::ConfigIO;
use crate::config::types::{Config, UserProfile};
use crate::device::events::ScaleEventChannel;
use crate::device::listener::{DeviceListener, SessionEnd};
use crate::device::sdk::{BtleScaleSdk, OfflineScaleSdk, ScaleSdk};
use crate::device::user::ScaleUser;
use crate::error::AppRunError;
use crate::notify::Host;
use crate::weighin::screen::WeighinScreen;
use crate::weighin::record::WeighinRecord;
use crate::weighin::submit::{Backend, WeighinMutation};

pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod notify;
pub mod weighin;

#[cfg(test)]
mod test_support;

pub fn init_logging(verbose: bool) {
    let level = match verbose {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info,
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

pub async fn run(cli: Cli) -> Result<(), AppRunError> {
    let config_io = ConfigIO::new_sync(cli.config.as_deref())?;
    let mut locker = config_io.locker()?;
    let _config_lock = locker.lock()?;

    let config = config_io.read().await?;

    match cli.command {
        Command::Scan(args) => run_scan(config, args).await,
        Command::Manual(args) => run_manual(config, args).await,
        Command::Profile(args) => run_profile(&config_io, config, args).await,
    }
}

async fn run_scan(config: Config, args: ScanArgs) -> Result<(), AppRunError> {
    let backend = Backend::from_config(&config.backend, args.dry_run)?;

    let submitted = if args.no_bluetooth {
        scan_with(OfflineScaleSdk::new(), config.profile, args.events, backend).await?
    }
    else {
        scan_with(BtleScaleSdk::new(), config.profile, args.events, backend).await?
    };

    if submitted.is_none() {
        info!("Nothing was submitted");
    }
    Ok(())
}

/// Runs one scan session fed by `events` and submits the reviewed values. Returns the submitted
/// record, or `None` when the session ended without a measurement.
async fn scan_with<S: ScaleSdk, M: WeighinMutation>(
    sdk: S,
    profile: Option<UserProfile>,
    events: Option<PathBuf>,
    mutation: M,
) -> Result<Option<WeighinRecord>, AppRunError> {
    let host = Host::logging();
    let channel = ScaleEventChannel::new();
    let listener = DeviceListener::new(sdk, host.clone(), &channel)?;
    let mut screen = WeighinScreen::new(listener, mutation, host, profile);

    let cancel = CancellationToken::new();
    let bridge = spawn_event_bridge(events, channel.clone(), cancel.clone());

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping the scan");
            ctrl_c_cancel.cancel();
        }
    });

    if let Err(err) = screen.on_start_scale().await {
        cancel.cancel();
        return Err(err.into());
    }
    println!("{}", screen.view());

    let end = screen.run_session(&cancel).await;
    cancel.cancel();

    match bridge.await? {
        Ok(forwarded) => info!("Forwarded {} scale events", forwarded),
        Err(err) if end == SessionEnd::Completed => warn!("Scale event input failed after the measurement: {}", err),
        Err(err) => return Err(err.into()),
    }

    if end != SessionEnd::Completed {
        warn!("Scan ended without a measurement ({:?})", end);
        return Ok(None);
    }

    println!("{}", screen.view());
    let values = screen.values();
    for (field, value) in values.entries() {
        println!("  {}: {}", field, if value.is_empty() { "-" } else { value });
    }

    Ok(Some(screen.submit().await?))
}

async fn forward_events(
    source: Option<&Path>,
    channel: &ScaleEventChannel,
    cancel: &CancellationToken,
) -> Result<usize, io::Error> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = match source {
        Some(path) if path != Path::new("-") => Box::new(File::open(path).await?),
        _ => Box::new(tokio::io::stdin()),
    };

    let mut lines = BufReader::new(reader).lines();
    let mut forwarded = 0;

    'mainloop: loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break 'mainloop;
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break 'mainloop;
                };

                let line = line.trim();
                if line.is_empty() {
                    continue 'mainloop;
                }

                let payload = serde_json::from_str::<Value>(line)
                    .unwrap_or_else(|_| Value::String(line.to_string()));

                if channel.emit(payload) {
                    forwarded += 1;
                }
            },
        }
    }

    Ok(forwarded)
}

/// Feeds JSON lines from `source` (stdin for `None` or `-`) into the event channel. The channel
/// is closed when input ends, fails or the bridge is cancelled. Lines that are not JSON are
/// passed on as strings so the listener reports them like any other malformed event.
fn spawn_event_bridge(
    source: Option<PathBuf>,
    channel: ScaleEventChannel,
    cancel: CancellationToken,
) -> JoinHandle<Result<usize, io::Error>> {
    tokio::spawn(async move {
        let result = forward_events(source.as_deref(), &channel, &cancel).await;
        if let Err(err) = &result {
            warn!("Failed to read scale events: {}", err);
        }

        channel.close();
        result
    })
}

async fn run_manual(config: Config, args: ManualArgs) -> Result<(), AppRunError> {
    let backend = Backend::from_config(&config.backend, args.dry_run)?;
    let host = Host::logging();
    let channel = ScaleEventChannel::new();
    let listener = DeviceListener::new(OfflineScaleSdk::new(), host.clone(), &channel)?;
    let mut screen = WeighinScreen::new(listener, backend, host, config.profile);

    screen.on_record_manually();
    let values = args.form_values();
    for (field, value) in values.entries() {
        screen.set_field(field, value);
    }

    screen.submit().await?;
    Ok(())
}

async fn run_profile(config_io: &ConfigIO, mut config: Config, args: ProfileArgs) -> Result<(), AppRunError> {
    if args.is_update() {
        config.profile = Some(args.apply(config.profile.take()));
        config_io.save(&config).await?;
    }

    let user = ScaleUser::from_profile(config.profile.as_ref())?;
    println!("Email: {}", user.id);
    println!("Height: {} cm", user.height);
    println!("Gender: {}", user.gender);
    println!("Birthday: {}", user.birthday);
    println!("Athlete mode: {}", if user.athlete_type == 1 { "on" } else { "off" });
    Ok(())
}
