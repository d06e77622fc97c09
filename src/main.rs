use clap::{Parser, Subcommand};
use escuelas_dashboard::{check, config, server};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Validate every year's data against the boundaries and asset table
    Check {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            server::start_server(app_config).await?;
        }
        Commands::Check { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let report = check::run(&app_config)?;

            for year in &report.years {
                println!(
                    "{}: {} provincias, duplicadas {:?}, sin datos {:?}",
                    year.year, year.rows, year.duplicates, year.unmatched
                );
            }
            for year in &report.missing_years {
                println!("{}: archivo ausente", year);
            }
            println!("{} recursos estáticos ausentes", report.missing_assets.len());

            if !report.is_clean() {
                anyhow::bail!("data check failed");
            }
        }
    }

    Ok(())
}
