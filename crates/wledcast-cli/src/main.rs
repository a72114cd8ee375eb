use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;
use wledcast_core::{
    ConfigError, DeliveryMode, Destination, DmxFrame, EncodingError, SacnSender, SendError,
    SendReport, SenderConfig, verify_data_packet,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("WLEDCAST_BUILD_COMMIT"),
    ", built ",
    env!("WLEDCAST_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  wledcast preset 5 --dest 192.168.8.118 --dest 192.168.8.210\n  wledcast color 255 0 0 --brightness 128 --dest 192.168.8.118\n  wledcast frame --channel 1=255 --channel 2=5 --multicast --stdout\n  wledcast encode --channel 1=5 -o packet.bin";

#[derive(Parser, Debug)]
#[command(name = "wledcast")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Send E1.31 (sACN) DMX frames to WLED and other lighting controllers.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a frame built from channel assignments or a raw 512-byte file.
    Frame {
        #[command(flatten)]
        frame: FrameArgs,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Select a WLED preset (channel 1 = brightness, channel 2 = preset).
    Preset {
        /// Preset id (0-250)
        id: u8,
        /// Master brightness
        #[arg(long, default_value_t = 255)]
        brightness: u8,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Switch output on or off in preset mode.
    Power {
        /// Desired state
        #[arg(value_enum)]
        state: PowerState,
        /// Brightness used when switching on
        #[arg(long, default_value_t = 255)]
        brightness: u8,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Fill RGBW LEDs with one colour.
    Color {
        red: u8,
        green: u8,
        blue: u8,
        /// Scale applied to every channel
        #[arg(long, default_value_t = 255)]
        brightness: u8,
        /// Number of LEDs to light (max 128 per universe)
        #[arg(long, default_value_t = 128)]
        leds: usize,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Send an all-zero frame.
    Blackout {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Tell receivers this source stops sending the universe.
    Terminate {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Encode a packet without sending it.
    #[command(
        after_help = "Examples:\n  wledcast encode --channel 1=5 -o packet.bin\n  wledcast encode --file frame.bin --hex"
    )]
    Encode {
        #[command(flatten)]
        frame: FrameArgs,
        #[command(flatten)]
        target: TargetArgs,
        /// Write raw packet bytes to this path
        #[arg(short = 'o', long, required_unless_present = "hex")]
        output: Option<PathBuf>,
        /// Print the packet as hex to stdout
        #[arg(long, conflicts_with = "output")]
        hex: bool,
        /// Suppress the header summary
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PowerState {
    On,
    Off,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Channel assignment CHANNEL=VALUE (1-based, repeatable)
    #[arg(short = 'c', long = "channel", value_parser = parse_channel)]
    channels: Vec<(usize, u8)>,

    /// Raw frame file (exactly 512 bytes); --channel values apply on top
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// JSON sender configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Destination host or host:port (repeatable)
    #[arg(short = 'd', long = "dest")]
    destinations: Vec<String>,

    /// Default destination port
    #[arg(long)]
    port: Option<u16>,

    /// Universe number
    #[arg(short = 'u', long)]
    universe: Option<u16>,

    /// Source name advertised in every packet (truncated to 64 bytes)
    #[arg(long)]
    source_name: Option<String>,

    /// Source CID (32 hex digits); random when omitted
    #[arg(long)]
    cid: Option<String>,

    /// Packet priority (0-200)
    #[arg(long)]
    priority: Option<u8>,

    /// Mark packets as preview data
    #[arg(long)]
    preview: bool,

    /// Send to the universe's multicast group
    #[arg(long, conflicts_with = "broadcast")]
    multicast: bool,

    /// Send to the broadcast address of the first destination's /24
    #[arg(long)]
    broadcast: bool,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write the JSON send report to this path
    #[arg(short = 'o', long)]
    report: Option<PathBuf>,

    /// Write the JSON send report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if any destination failed
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Frame {
            frame,
            target,
            output,
        } => build_frame(&frame).and_then(|f| cmd_send(&target, &output, &f)),
        Commands::Preset {
            id,
            brightness,
            target,
            output,
        } => cmd_send(&target, &output, &DmxFrame::preset(brightness, id)),
        Commands::Power {
            state,
            brightness,
            target,
            output,
        } => cmd_send(
            &target,
            &output,
            &DmxFrame::power(state == PowerState::On, brightness),
        ),
        Commands::Color {
            red,
            green,
            blue,
            brightness,
            leds,
            target,
            output,
        } => cmd_send(
            &target,
            &output,
            &DmxFrame::solid_color([red, green, blue], brightness, leds),
        ),
        Commands::Blackout { target, output } => {
            cmd_send(&target, &output, &DmxFrame::blackout())
        }
        Commands::Terminate { target, output } => cmd_terminate(&target, &output),
        Commands::Encode {
            frame,
            target,
            output,
            hex,
            quiet,
        } => cmd_encode(&frame, &target, output, hex, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match err {
            ConfigError::NoDestinations | ConfigError::NoBroadcastBoard => {
                "pass --dest HOST[:PORT], use --multicast, or list destinations in --config"
            }
            ConfigError::Cid(_) => "use 32 hex digits, e.g. 12345678-9abc-def0-1234-56789abcdef0",
            ConfigError::Io { .. } | ConfigError::Json { .. } => "check the --config file",
            _ => "check the sender settings",
        };
        CliError::new(err.to_string(), Some(hint.to_string()))
    }
}

impl From<EncodingError> for CliError {
    fn from(err: EncodingError) -> Self {
        let hint = match err {
            EncodingError::InvalidFrameLength { .. } => "frame files must hold exactly 512 bytes",
            EncodingError::InvalidChannel { .. } => "channels are numbered 1 to 512",
            EncodingError::InvalidPriority { .. } => "use a priority between 0 and 200",
            EncodingError::LengthOverflow { .. } => "the frame does not fit in one packet",
        };
        CliError::new(err.to_string(), Some(hint.to_string()))
    }
}

impl From<SendError> for CliError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Encoding(err) => err.into(),
            SendError::Transport(err) => CliError::new(
                err.to_string(),
                Some("check the network configuration".to_string()),
            ),
        }
    }
}

fn parse_channel(value: &str) -> Result<(usize, u8), String> {
    let (channel, level) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CHANNEL=VALUE, got '{value}'"))?;
    let channel = channel
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid channel '{channel}'"))?;
    if !(1..=512).contains(&channel) {
        return Err(format!("channel {channel} out of range 1-512"));
    }
    let level = level
        .trim()
        .parse::<u8>()
        .map_err(|_| format!("invalid value '{level}' (0-255)"))?;
    Ok((channel, level))
}

fn build_frame(args: &FrameArgs) -> Result<DmxFrame, CliError> {
    let mut frame = match &args.file {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read frame file: {}", path.display()))?;
            DmxFrame::from_slice(&bytes)?
        }
        None => DmxFrame::new(),
    };
    for (channel, value) in &args.channels {
        frame.set(*channel, *value)?;
    }
    Ok(frame)
}

fn load_config(target: &TargetArgs) -> Result<SenderConfig, CliError> {
    let mut config = match &target.config {
        Some(path) => {
            debug!("loading config from {}", path.display());
            SenderConfig::from_json_file(path)?
        }
        None => SenderConfig::default(),
    };
    if !target.destinations.is_empty() {
        config.destinations = target.destinations.clone();
    }
    if let Some(port) = target.port {
        config.port = port;
    }
    if let Some(universe) = target.universe {
        config.universe = universe;
    }
    if let Some(name) = &target.source_name {
        config.source_name = name.clone();
    }
    if let Some(cid) = &target.cid {
        config.cid = Some(cid.clone());
    }
    if let Some(priority) = target.priority {
        config.priority = priority;
    }
    if target.preview {
        config.preview = true;
    }
    if target.multicast {
        config.delivery = DeliveryMode::Multicast;
    }
    if target.broadcast {
        config.delivery = DeliveryMode::Broadcast;
    }
    Ok(config)
}

fn cmd_send(target: &TargetArgs, output: &OutputArgs, frame: &DmxFrame) -> Result<(), CliError> {
    let config = load_config(target)?;
    let mut sender = SacnSender::new(&config)?;
    let report = sender.send(config.universe, frame.as_slice())?;
    emit_reports(output, &[report])
}

fn cmd_terminate(target: &TargetArgs, output: &OutputArgs) -> Result<(), CliError> {
    let config = load_config(target)?;
    let mut sender = SacnSender::new(&config)?;
    let reports = sender.terminate(config.universe)?;
    emit_reports(output, &reports)
}

fn cmd_encode(
    frame: &FrameArgs,
    target: &TargetArgs,
    output: Option<PathBuf>,
    hex: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let mut config = load_config(target)?;
    // Encoding never touches the network; a placeholder keeps validation happy.
    if config.destinations.is_empty() && config.delivery != DeliveryMode::Multicast {
        config.destinations = vec![Destination::new("127.0.0.1", config.port).to_string()];
    }
    let mut sender = SacnSender::new(&config)?;
    let packet = sender.build_packet(config.universe, build_frame(frame)?.as_slice())?;
    let headers =
        verify_data_packet(packet.as_bytes()).context("encoded packet failed verification")?;

    if hex {
        let text: String = packet.as_bytes().iter().map(|b| format!("{:02x}", b)).collect();
        println!("{}", text);
    } else {
        let path = output.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--output or --hex".to_string()),
            )
        })?;
        write_file(&path, packet.as_bytes())?;
        if !quiet {
            eprintln!("OK: {} bytes written -> {}", packet.len(), path.display());
        }
    }

    if !quiet {
        let summary = serde_json::to_string(&headers).context("JSON serialization failed")?;
        eprintln!("{}", summary);
    }
    Ok(())
}

fn emit_reports(output: &OutputArgs, reports: &[SendReport]) -> Result<(), CliError> {
    let json = serialize_reports(reports, output.pretty, output.compact)?;

    if output.stdout {
        let mut out = std::io::stdout().lock();
        out.write_all(json.as_bytes())
            .and_then(|_| out.flush())
            .context("Failed to write report to stdout")?;
    } else if let Some(path) = &output.report {
        write_file(path, json.as_bytes())?;
        if !output.quiet {
            eprintln!("OK: report written -> {}", path.display());
        }
    }

    let failed: usize = reports.iter().map(|r| r.failed_count()).sum();
    if !output.quiet {
        for report in reports {
            for dest in report.destinations.iter().filter(|d| d.error.is_some()) {
                eprintln!(
                    "warning: {}: {}",
                    dest.destination,
                    dest.error.as_deref().unwrap_or("send failed")
                );
            }
        }
        if !output.stdout && output.report.is_none() {
            if let Some(last) = reports.last() {
                eprintln!(
                    "OK: universe {} seq {} ({} bytes) sent to {}/{} destination(s)",
                    last.universe,
                    last.sequence,
                    last.packet_bytes,
                    last.sent_count(),
                    last.destinations.len()
                );
            }
        }
    }

    if output.strict && failed > 0 {
        return Err(CliError::new(
            format!("delivery failed for {} destination(s)", failed),
            Some("check the destination addresses or drop --strict".to_string()),
        ));
    }
    Ok(())
}

fn serialize_reports(
    reports: &[SendReport],
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let value = match reports {
        [single] => serde_json::to_value(single),
        many => serde_json::to_value(many),
    }
    .context("JSON serialization failed")?;
    if pretty {
        serde_json::to_string_pretty(&value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(&value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
