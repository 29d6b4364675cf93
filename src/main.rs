use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dlms_rs::dlms::{self, IntegrityMode};
use dlms_rs::util::hex::{encode_hex, read_capture};
use dlms_rs::{
    init_logger, log_info, AppConfig, Decoder, FieldRegistry, ObisCode, ReadingCollector,
};

#[derive(Parser)]
#[command(name = "dlms-cli")]
#[command(about = "Decode DLMS push frames from a meter HAN port")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Reject frames with a bad HCS or FCS
    #[arg(long, global = true)]
    verify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the serial port and print one JSON reading per frame
    Listen {
        port: Option<String>,
        #[arg(short, long)]
        baudrate: Option<u32>,
        /// Quiet period before decoding starts, in milliseconds
        #[arg(long)]
        silence_ms: Option<u64>,
    },
    /// Decode a hex capture file
    Decode {
        file: std::path::PathBuf,
        /// Print assembled readings instead of individual fields
        #[arg(long)]
        readings: bool,
    },
    /// List the OBIS registry
    Registry,
    /// Look up one OBIS code, e.g. 1-1:32.7.0.255
    Lookup { obis: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => AppConfig::default(),
    };
    if cli.verify {
        config.decoder.integrity = IntegrityMode::Verify;
    }

    match cli.command {
        Commands::Listen {
            port,
            baudrate,
            silence_ms,
        } => {
            if let Some(port) = port {
                config.serial.port = port;
            }
            if let Some(baudrate) = baudrate {
                config.serial.baudrate = baudrate;
            }
            if let Some(silence_ms) = silence_ms {
                config.serial.silence_ms = silence_ms;
            }

            let (collector, mut rx) = ReadingCollector::channel();
            let printer = tokio::spawn(async move {
                while let Some(reading) = rx.recv().await {
                    match serde_json::to_string(&reading) {
                        Ok(line) => println!("{line}"),
                        Err(e) => log::warn!("Cannot serialise reading: {e}"),
                    }
                }
            });

            let mut decoder = Decoder::with_config(collector, config.decoder.clone());
            let stats = dlms_rs::listen(&config.serial, &mut decoder)
                .await
                .with_context(|| format!("listening on {}", config.serial.port))?;
            drop(decoder);
            printer.await.context("reading printer task")?;
            log_info(&format!("Stopped: {stats:?}"));
        }
        Commands::Decode { file, readings } => {
            let bytes = read_capture(&file)
                .with_context(|| format!("reading capture {}", file.display()))?;
            if readings {
                let (readings, summary) = dlms_rs::collect_readings(&bytes, config.decoder);
                for reading in readings {
                    println!("{}", serde_json::to_string(&reading)?);
                }
                log_info(&format!("{summary:?}"));
            } else {
                let mut decoder = Decoder::with_config(
                    |f: &dlms::Field<'_>| match f.label {
                        Some(label) => println!("{:<22} {:<24} {}", f.kind, label, encode_hex(f.payload)),
                        None => println!("{:<22} {:<24} {}", f.kind, "", encode_hex(f.payload)),
                    },
                    config.decoder,
                );
                let summary = decoder.feed_all(&bytes);
                log_info(&format!("{summary:?}"));
            }
        }
        Commands::Registry => {
            for entry in FieldRegistry::standard().entries() {
                println!(
                    "{:<16} {:<22} {} {}",
                    entry.address.to_string(),
                    entry.kind.to_string(),
                    entry.width,
                    entry.label
                );
            }
        }
        Commands::Lookup { obis } => {
            let code: ObisCode = obis.parse()?;
            match FieldRegistry::standard().lookup(&code) {
                Some(entry) => println!("{}", serde_json::to_string_pretty(entry)?),
                None => anyhow::bail!("{code} is not in the registry"),
            }
        }
    }

    Ok(())
}
