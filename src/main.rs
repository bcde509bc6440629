//! Focus Audio CLI
//!
//! Command-line interface for the focus audio engine.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use focus_audio::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Focus Audio v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Focus Audio v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Render {
            out,
            seconds,
            bit_depth,
            mix,
        } => commands::render(&out, seconds, bit_depth, &mix)?,
        #[cfg(feature = "device")]
        Commands::Play { seconds, mix } => commands::play(seconds, &mix)?,
        Commands::Presets => commands::list_presets()?,
        Commands::Analyze {
            noise,
            seconds,
            sample_rate,
            seed,
        } => commands::analyze(noise, seconds, sample_rate, seed)?,
        Commands::Discover { dir } => commands::discover(&dir)?,
    }
    Ok(())
}
