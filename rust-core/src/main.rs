use fir_equalizer::audio::{list_output_devices, AudioError, LiveDevice};
use fir_equalizer::config::{ConfigError, EqualizerConfig, Verbosity};
use fir_equalizer::filters::{DesignError, FilterDesigner, WindowType};
use fir_equalizer::reload::{
    send_spec, ChannelError, DeviceSink, NullDevice, ReloadChannel, ReloadServer,
};
use log::{error, info, Level};
use std::convert::Infallible;
use std::path::PathBuf;
use std::process::ExitCode;
use structopt::StructOpt;
use thiserror::Error;

fn parse_sample_rate(src: &str) -> Result<f64, String> {
    let rate: f64 = src
        .parse()
        .map_err(|_| format!("Sample rate {} must be a number", src))?;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(format!("Sample rate {} must be positive", src));
    }
    Ok(rate)
}

fn parse_block_size(src: &str) -> Result<usize, String> {
    let num: usize = src
        .parse()
        .map_err(|_| format!("Block size {} must be an integer", src))?;
    if num < 2 {
        return Err(format!("Block size {} must be >= 2", num));
    }
    if num % 2 != 0 {
        return Err(format!("Block size {} must be even", num));
    }
    Ok(num)
}

/// Hot-reloadable linear-phase FIR equalizer
///
/// Send a curve as whitespace-separated `frequency amplitude` pairs to the
/// reload socket, e.g. `equalizer --send "1000 1.0 2000 0.0 24000 0.0"`.
#[derive(StructOpt, Debug)]
#[structopt(name = "equalizer")]
struct Opt {
    /// Output device name, "default" for the host default or "none" to
    /// only design kernels without touching audio hardware
    #[structopt(short, long, default_value = "default")]
    device: String,

    /// Sample rate in Hz, must match the device
    #[structopt(short = "r", long, default_value = "48000", parse(try_from_str = parse_sample_rate))]
    sample_rate: f64,

    /// Kernel length in samples. Larger values give finer frequency
    /// resolution at the cost of latency (half a block).
    #[structopt(short, long, default_value = "2048", parse(try_from_str = parse_block_size))]
    block_size: usize,

    /// Number of device channels receiving the kernel
    #[structopt(short, long, default_value = "2")]
    channels: usize,

    /// Path of the reload socket
    #[structopt(short = "s", long = "config", default_value = "/tmp/equalizer.socket", parse(from_os_str))]
    socket: PathBuf,

    /// Window applied to the kernel: hann, hamming, blackman or rectangular
    #[structopt(short, long, default_value = "hann")]
    window: WindowType,

    /// Run detached from the terminal; implies --quiet
    #[structopt(short = "B", long)]
    background: bool,

    /// Suppress all output
    #[structopt(short, long)]
    quiet: bool,

    /// Also print the achieved response and taps after each reload
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// Send a curve to a running equalizer and exit
    #[structopt(long, value_name = "CURVE")]
    send: Option<String>,

    /// List output devices and exit
    #[structopt(long)]
    list_devices: bool,
}

impl Opt {
    fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet || self.background, self.verbose)
    }

    fn config(&self) -> EqualizerConfig {
        EqualizerConfig {
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            channels: self.channels,
            device: self.device.clone(),
            socket_path: self.socket.clone(),
            window_type: self.window,
            verbosity: self.verbosity(),
        }
    }
}

#[derive(Error, Debug)]
enum Fatal {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Design(#[from] DesignError),

    #[error("Cannot open audio device: {0}")]
    Device(#[from] AudioError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl Fatal {
    /// sysexits(3) codes
    fn exit_code(&self) -> u8 {
        match self {
            Fatal::Config(_) | Fatal::Design(_) => 64,
            Fatal::Device(_) => 69,
            Fatal::Channel(_) => 70,
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    // Fatal errors are reported even when silent
    let level = verbosity.level_filter().to_level().unwrap_or(Level::Error);
    if nih_log::LoggerBuilder::new(level.to_level_filter()).build_global().is_err() {
        eprintln!("Could not install logger");
    }
}

fn serve_with<S: DeviceSink>(
    config: &EqualizerConfig,
    designer: FilterDesigner,
    sink: S,
    mut channel: ReloadChannel,
) -> Result<Infallible, Fatal> {
    let latency_ms = 1000.0 * designer.group_delay_samples() as f64 / config.sample_rate;
    let mut server = ReloadServer::new(designer, sink, config.channels, config.verbosity)?;
    server.install_active();

    info!(
        "Equalizer ready: {} Hz, {} taps ({:.1} ms latency), {} window, listening on {}",
        config.sample_rate,
        config.block_size,
        latency_ms,
        config.window_type,
        config.socket_path.display()
    );
    server.serve(&mut channel)
}

fn run(config: &EqualizerConfig) -> Result<Infallible, Fatal> {
    config.validate()?;

    let designer = config.designer()?;
    let channel = ReloadChannel::bind(&config.socket_path)?;

    if config.uses_null_device() {
        let sink = NullDevice::new(config.channels, config.block_size);
        serve_with(config, designer, sink, channel)
    } else {
        let sink = LiveDevice::start(config, designer.group_delay_samples())?;
        serve_with(config, designer, sink, channel)
    }
}

fn main() -> ExitCode {
    let opt = Opt::from_args();
    init_logging(opt.verbosity());

    if opt.list_devices {
        return match list_output_devices() {
            Ok(devices) => {
                for (device, is_default) in devices {
                    let marker = if is_default { " [default]" } else { "" };
                    println!(
                        "{} ({} Hz, {} ch){}",
                        device.name, device.sample_rate, device.channels, marker
                    );
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::from(69)
            }
        };
    }

    if let Some(spec) = &opt.send {
        return match send_spec(&opt.socket, spec) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Cannot send to {}: {}", opt.socket.display(), e);
                ExitCode::from(69)
            }
        };
    }

    match run(&opt.config()) {
        Ok(never) => match never {},
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
