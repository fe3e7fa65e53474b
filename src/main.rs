//! mkshbootimg - pack a kernel, boot image and optional recovery image
//! into a single block-aligned boot image.
//!
//! ```text
//! mkshbootimg output kernel boot [recovery]
//! ```

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shbootimg::bootimg;
use shbootimg::config::Config;
use shbootimg::timing::Timer;

#[derive(Parser)]
#[command(name = "mkshbootimg")]
#[command(about = "Pack kernel, boot and recovery images into one boot image")]
struct Cli {
    /// Output image (created or truncated)
    output: PathBuf,
    /// Kernel image, placed at byte 0
    kernel: PathBuf,
    /// Boot filesystem image
    boot: PathBuf,
    /// Recovery filesystem image
    recovery: Option<PathBuf>,
}

fn usage() -> String {
    let argv0 = std::env::args().next().unwrap_or_else(|| "mkshbootimg".to_string());
    format!("Usage: {} output kernel boot [recovery]", argv0)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(shbootimg::config::DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let timer = Timer::start("pack");
    let layout = bootimg::pack_files(
        &cli.output,
        &cli.kernel,
        &cli.boot,
        cli.recovery.as_deref(),
    )
    .with_context(|| format!("Failed to pack {}", cli.output.display()))?;
    timer.finish();

    println!(
        "boot: offset={} len={}",
        layout.boot.offset, layout.boot.len
    );
    if let Some(recovery) = layout.recovery {
        println!("recovery: offset={} len={}", recovery.offset, recovery.len);
    }
    println!("Created {} ({} bytes)", cli.output.display(), layout.total_len);

    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            println!("{}", usage());
            return ExitCode::from(1);
        }
        Err(e) => e.exit(),
    };

    let config = Config::load();
    init_logging(&config);
    config.print();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
