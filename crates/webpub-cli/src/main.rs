mod commands;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "webpub",
    about = "Build a server-rendered web app and publish its static assets"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, build, relocate templates, and publish assets
    Compile {
        /// Project root directory
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Show what `compile` would do without touching the filesystem
    Plan {
        /// Project root directory
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { root } => commands::compile(&root).await?,
        Commands::Plan { root } => commands::plan(&root)?,
    }

    Ok(())
}
