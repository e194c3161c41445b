mod config;
mod list;
mod os_signal;

use std::time::Duration;

use clap::{CommandFactory, Parser};
use color_eyre::eyre::{Context, eyre};
use rdpc101::{
    Band, BandKind, BandMap, CancelFlag, ChannelMode, SeekDirection, SeekWait, Tuning,
};
use tracing_subscriber::EnvFilter;

use crate::list::status_line;

/// Control an RDPC-101 USB AM/FM radio tuner.
///
/// With a frequency, tune to it. The frequency is taken as MHz if that lands
/// in an FM band (`80.0`), otherwise as kHz for AM (`999`).
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Use the Nth tuner, in the order shown by --list
    #[arg(short, long)]
    device: Option<usize>,

    /// Seek upward to the next station
    #[arg(short = 'U', long, conflicts_with = "down")]
    up: bool,

    /// Seek downward to the next station
    #[arg(short = 'D', long)]
    down: bool,

    /// Force mono reception
    #[arg(short, long, conflicts_with = "stereo")]
    mono: bool,

    /// Allow stereo reception
    #[arg(short, long)]
    stereo: bool,

    /// List tuners and their status, then exit
    #[arg(short, long)]
    list: bool,

    /// Scan for stations across a band (am or fm)
    #[arg(short = 'S', long, value_name = "BAND")]
    scan: Option<String>,

    /// Tune the frequency exactly, without rounding to the band's channel step
    #[arg(short = 'x', long)]
    exact: bool,

    #[command(flatten)]
    params: config::TunerParams,

    /// Frequency in megahertz (FM) or kilohertz (AM)
    freq: Option<String>,
}

/// How long a cancelled operation gets to restore the tuner before the process
/// exits anyway.
const QUIT_GRACE: Duration = Duration::from_secs(3);

/// What to do once the tuner is open.
#[derive(Clone, Copy, Debug)]
enum Action {
    Tune(Tuning),
    Seek(SeekDirection),
    Scan(Band),
    Status,
}

/// Report bad user input along with the usage, and exit before the tuner is
/// touched.
fn usage_error(msg: &str) -> ! {
    eprintln!("{msg}");
    let _ = Cli::command().print_help();
    std::process::exit(1);
}

impl Cli {
    fn action(&self, map: &BandMap) -> Action {
        if let Some(freq) = self.freq.as_deref() {
            let Ok(freq) = freq.trim().parse::<f64>() else {
                usage_error("freq must be numerals");
            };
            let Some(tuning) = map.tuning_freq(freq, self.exact) else {
                usage_error("Frequency out of range");
            };
            return Action::Tune(tuning);
        }
        if self.up {
            return Action::Seek(SeekDirection::Up);
        }
        if self.down {
            return Action::Seek(SeekDirection::Down);
        }
        if let Some(band) = self.scan.as_deref() {
            let Ok(kind) = band.parse::<BandKind>() else {
                usage_error("unsupported band");
            };
            let Some(span) = map.scan_span(kind) else {
                usage_error("unsupported band");
            };
            return Action::Scan(span);
        }
        Action::Status
    }

    fn channel_mode(&self) -> Option<ChannelMode> {
        match (self.mono, self.stereo) {
            (true, _) => Some(ChannelMode::Mono),
            (_, true) => Some(ChannelMode::Stereo),
            _ => None,
        }
    }

    /// Resolve `--device` to a tuner path, exiting if the index is out of
    /// range.
    fn device_path(&self) -> color_eyre::Result<Option<String>> {
        let Some(index) = self.device else {
            return Ok(None);
        };
        let devices =
            rdpc101::list_tuner_devices().wrap_err("Couldn't enumerate RDPC-101 tuners")?;
        match devices.get(index) {
            Some(dev) => Ok(Some(dev.path())),
            None => {
                eprintln!("Device index out of range");
                std::process::exit(1);
            }
        }
    }
}

fn run(
    path: Option<String>,
    map: BandMap,
    action: Action,
    mode: Option<ChannelMode>,
    wait: SeekWait,
) -> color_eyre::Result<()> {
    let mut tuner = match path.as_deref() {
        Some(path) => rdpc101::open_tuner_path(path),
        None => rdpc101::open_tuner(),
    }
    .wrap_err("Failed to open the tuner")?;

    match action {
        Action::Tune(tuning) => {
            let status = tuner
                .tune(&map, &tuning, &wait)
                .wrap_err("Failed tuning")?;
            println!("{}", status_line(&map, &status));
        }
        Action::Seek(direction) => {
            let status = tuner
                .seek_station(direction, &wait)
                .wrap_err("Failed seeking")?;
            println!("{}", status_line(&map, &status));
        }
        Action::Scan(band) => {
            let count = tuner
                .scan(&map, &band, &wait, |status| {
                    println!("{}", status_line(&map, status))
                })
                .wrap_err_with(|| format!("Failed scanning the {} band", band.kind))?;
            tracing::info!(count, "scan complete");
        }
        Action::Status => {
            let status = tuner.refresh().wrap_err("Failed reading tuner status")?;
            println!("{}", status_line(&map, &status));
        }
    }

    if let Some(mode) = mode {
        tuner
            .set_channel_mode(mode)
            .wrap_err("Failed setting channel mode")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let map = BandMap::for_region(args.params.region);

    if args.list {
        return list::cmd(&map);
    }

    // Validate everything before the tuner is opened.
    let action = args.action(&map);
    let mode = args.channel_mode();
    let cancel = CancelFlag::new();
    let wait = args.params.seek_wait(cancel.clone())?;
    let path = args.device_path()?;

    let quit = os_signal::quit_watch().await;
    tokio::spawn(async move {
        quit.cancel_with_grace(&cancel, QUIT_GRACE).await;
        tracing::warn!("tuner did not stop after quit request, exiting");
        std::process::exit(130);
    });

    tokio::task::spawn_blocking(move || run(path, map, action, mode, wait))
        .await
        .map_err(|e| eyre!("Tuner task failed: {e}"))?
}
