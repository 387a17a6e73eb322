//! airbrush: interactive entry point.

use airbrush::app::{self, AppConfig, ReplayOutputs, RunOptions};
use airbrush::cli::{Cli, Commands};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None       => AppConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Run { record: None, replay: None, load: None, save: None }) {
        Commands::Run { record, replay, load, save } => {
            banner(replay.is_some());
            app::run(config, RunOptions { record, replay, load, save })?;
        }
        Commands::Replay { frames, png, json, doc } => {
            let app = app::replay(&config, &frames, &ReplayOutputs { png, json, doc })?;
            println!("{}", app.status());
        }
        Commands::Config { output } => match output {
            Some(path) => {
                config.save(&path)?;
                info!(path = %path.display(), "config written");
            }
            None => print!("{}", config.to_toml()?),
        },
    }

    Ok(())
}

fn banner(replaying: bool) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              airbrush: draw in the air with a pinch          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    if replaying {
        println!("  Mode: recorded replay");
    } else {
        println!("  Mode: mouse simulation");
        println!("  Hold LMB to draw   Space+drag = width   F = fist (cycle brush)");
        println!("  H = hide hand   U/R/C = undo/redo/clear   1-6 = presets   Q = quit");
    }
    println!();
}
