//! jsfx CLI - inspect JSFX effect files without running them.

mod commands;
mod runtime;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jsfx")]
#[command(author, version, about = "JSFX effect inspector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header, sections and imports of an effect
    Info(commands::info::InfoArgs),

    /// Show or write the host settings file
    Settings(commands::settings::SettingsArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Settings(args) => commands::settings::run(args),
    }
}
