use clap::Parser;
use profanity_capture::{setup_logging, validate_config, Cli, CliRunner, Config, Metrics};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    setup_logging(args.verbose).map_err(|e| anyhow::anyhow!("{e}"))?;

    info!("Starting profanity-capture v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args).await?;

    let metrics = Arc::new(Metrics::new());
    let runner = CliRunner::new(config, metrics).await?;

    // Graceful shutdown on SIGINT/SIGTERM
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::broadcast::channel(1);
    let _shutdown_handler = setup_shutdown_handler(shutdown_tx);

    let result = tokio::select! {
        result = runner.run(args.command) => {
            info!("Application completed");
            result
        }
        _ = shutdown_rx.recv() => {
            info!("Received shutdown signal");
            Ok(())
        }
    };

    info!("Shutting down...");
    runner.service.shutdown().await;

    if let Err(e) = result {
        error!("Application error: {}", e);
        std::process::exit(1);
    }

    info!("profanity-capture stopped");
    Ok(())
}

async fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        let config_content = tokio::fs::read_to_string(config_path).await?;
        serde_json::from_str(&config_content)?
    } else {
        Config::default()
    };

    // Environment, then CLI arguments, override the file
    if let Ok(port) = std::env::var("PORT") {
        if let Ok(port) = port.parse() {
            config.listen_port = port;
        }
    }
    if let Ok(sep) = std::env::var("SEP") {
        config.log_separator = sep;
    }

    if let Some(port) = args.port {
        config.listen_port = port;
    }
    if let Some(dictionary) = &args.dictionary {
        config.dictionary_path = dictionary.clone();
    }
    if let Some(storage) = &args.storage {
        config.storage_root = storage.clone();
    }
    if let Some(retention) = args.retention {
        config.retention = Duration::from_secs(retention);
    }
    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }

    validate_config(&config)?;

    info!("Configuration loaded successfully");
    info!("Listen port: {}", config.listen_port);
    info!("Storage root: {}", config.storage_root.display());
    info!("Dictionary: {}", config.dictionary_path.display());
    info!("Retention window: {:?}", config.retention);

    Ok(config)
}

fn setup_shutdown_handler(
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to create SIGINT handler");
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to create SIGTERM handler");

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }

        let _ = shutdown_tx.send(());
    })
}
