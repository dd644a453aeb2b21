// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! gRNA design web service
//!
//! REST API for designing CRISPR guide RNAs against the gene registered for a
//! crop/trait pair. Gene sequences are fetched from Ensembl, falling back to
//! NCBI; explanations are requested from Gemini when an API key is set.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::util::SubscriberInitExt;

use agro_grna::service::{build_analyzer, create_app, ServiceConfig};

#[derive(Parser)]
#[command(name = "grna-web")]
#[command(about = "CRISPR guide RNA design web service for crop traits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web service
    Serve {
        /// Configuration file path
        #[arg(short, long, default_value = "config/service.toml")]
        config: PathBuf,

        /// Override host address
        #[arg(long)]
        host: Option<String>,

        /// Override port
        #[arg(short, long)]
        port: Option<u16>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long, default_value = "info")]
        log_level: String,
    },

    /// Generate a sample configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/service.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Check configuration and sequence source availability
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/service.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            log_level,
        } => serve_command(config, host, port, log_level).await,
        Commands::Config { output, force } => config_command(output, force),
        Commands::Check { config } => check_command(config).await,
    }
}

async fn serve_command(
    config_path: PathBuf,
    host_override: Option<String>,
    port_override: Option<u16>,
    log_level: String,
) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&log_level)?;

    info!("Starting agro-grna web service");

    let mut config = load_or_default_config(&config_path)?;

    if let Some(host) = host_override {
        config.server.host = host;
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e.into());
    }

    info!("Configuration loaded successfully");
    info!("Sequence sources (in order): {:?}", config.enabled_sources());

    let (app, _state) = create_app(config.clone())?;

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("gRNA design service running on http://{}", addr);
    info!("Health check available at http://{}/api/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn config_command(output_path: PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output_path.exists() && !force {
        eprintln!(
            "Configuration file already exists: {}",
            output_path.display()
        );
        eprintln!("Use --force to overwrite");
        std::process::exit(1);
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    ServiceConfig::default().to_file(&output_path)?;

    println!(
        "Sample configuration file created: {}",
        output_path.display()
    );
    println!("Edit the file to configure sources and scan settings");

    Ok(())
}

async fn check_command(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Checking configuration and source availability...");

    let config = load_or_default_config(&config_path)?;

    match config.validate() {
        Ok(()) => println!("Configuration is valid"),
        Err(e) => {
            println!("Configuration validation failed: {}", e);
            return Err(e.into());
        }
    }

    let analyzer = match build_analyzer(&config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            println!("Failed to initialize service: {}", e);
            return Err(e.into());
        }
    };

    println!(
        "\nRegistry: {} crops, {} traits",
        analyzer.registry().crop_count(),
        analyzer.registry().len()
    );
    println!(
        "Explanations: {}",
        if analyzer.has_explainer() {
            "enabled"
        } else {
            "placeholder only"
        }
    );

    println!("\nSource Status:");
    for (rank, source) in analyzer.resolver().sources().iter().enumerate() {
        match source.health_check().await {
            Ok(()) => println!("  OK {} (rank {}): reachable", source.name(), rank + 1),
            Err(e) => println!("  ERROR {} (rank {}): {}", source.name(), rank + 1, e),
        }
    }

    println!("\nHealth check completed");
    Ok(())
}

fn load_or_default_config(config_path: &Path) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    if config_path.exists() {
        info!("Loading configuration from {}", config_path.display());
        Ok(ServiceConfig::from_file(config_path)?)
    } else {
        info!("Configuration file not found, using defaults");
        println!(
            "WARNING: Configuration file not found: {}",
            config_path.display()
        );
        println!("TIP: Run 'grna-web config' to generate a sample configuration file");
        Ok(ServiceConfig::default())
    }
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    info!("Tracing initialized with level: {}", level);

    Ok(())
}
