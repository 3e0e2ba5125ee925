use crate::{
    sanitize_filename, ArtifactKind, CaptureRequest, CaptureService, Config, Metrics,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "profanity-capture")]
#[command(about = "Captures web pages with profane words redacted from markup and screenshot")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Listen port (overrides config and PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Dictionary file path")]
    pub dictionary: Option<PathBuf>,

    #[arg(long, help = "Artifact storage root")]
    pub storage: Option<PathBuf>,

    #[arg(long, help = "Artifact retention window in seconds")]
    pub retention: Option<u64>,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, help = "Chrome executable path")]
    pub chrome_path: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP capture service
    Serve {
        #[arg(long, help = "Export Prometheus metrics")]
        metrics: bool,
    },

    /// Capture a single URL from the command line
    Capture {
        #[arg(short, long, help = "URL to capture")]
        url: String,

        #[arg(long, help = "Artifact identifier (default: random)")]
        id: Option<String>,
    },

    /// Probe a URL's reachability without rendering it
    Check {
        #[arg(short, long, help = "URL to probe")]
        url: String,
    },

    /// Run one retention sweep pass and list what remains
    Sweep,

    /// Validate a configuration file
    Validate {
        #[arg(short, long, help = "Configuration file to validate")]
        config: PathBuf,
    },
}

pub struct CliRunner {
    pub config: Config,
    pub service: Arc<CaptureService>,
}

impl CliRunner {
    pub async fn new(config: Config, metrics: Arc<Metrics>) -> anyhow::Result<Self> {
        let dictionary = crate::Dictionary::load(&config.dictionary_path).await?;
        let service = Arc::new(CaptureService::new(config.clone(), dictionary, metrics).await?);

        Ok(Self { config, service })
    }

    pub async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Serve { metrics } => self.run_serve(metrics).await,
            Commands::Capture { url, id } => self.run_capture(url, id).await,
            Commands::Check { url } => self.run_check(url).await,
            Commands::Sweep => self.run_sweep().await,
            Commands::Validate { config } => validate_config_file(config).await,
        }
    }

    async fn run_serve(&self, export_metrics: bool) -> anyhow::Result<()> {
        if export_metrics {
            if let Err(e) = crate::install_prometheus_recorder() {
                error!("Failed to install metrics recorder: {e}");
            }
        }

        // The sweep runs for the lifetime of the server and dies with it
        let _sweeper = self.service.store().spawn_sweeper(
            self.config.sweep_interval,
            self.config.retention,
            self.service.metrics(),
        );

        crate::server::serve(self.service.clone(), self.config.listen_port).await
    }

    async fn run_capture(&self, url: String, id: Option<String>) -> anyhow::Result<()> {
        let request = match id {
            Some(id) => CaptureRequest::new(url, sanitize_filename(&id)),
            None => CaptureRequest {
                url,
                ..Default::default()
            },
        };

        let outcome = self.service.capture(request).await?;

        let markup = self
            .service
            .store()
            .fetch(&outcome.id, ArtifactKind::Markup)
            .await?;
        let screenshot = self
            .service
            .store()
            .fetch(&outcome.id, ArtifactKind::Screenshot)
            .await?;

        println!("Capture completed:");
        println!("  URL: {}", outcome.url);
        println!("  Snapshot: {}", markup.display());
        println!("  Screenshot: {}", screenshot.display());
        println!("  Word count: {}", outcome.stats.word_count);
        println!("  Profanity count: {}", outcome.stats.profanity_count);
        println!("  Profanity makeup: {}", outcome.stats.profanity_makeup);
        println!("  Duration: {}", crate::format_duration(outcome.duration));

        Ok(())
    }

    async fn run_check(&self, url: String) -> anyhow::Result<()> {
        let status = self.service.check_validity(&url).await;
        println!("{url}: {status}");
        Ok(())
    }

    async fn run_sweep(&self) -> anyhow::Result<()> {
        let store = self.service.store();
        let deleted = store.sweep_expired(self.config.retention).await?;
        println!("Deleted {deleted} expired artifact(s)");

        let mut remaining = store.list().await?;
        remaining.sort_by_key(|e| e.modified);
        for entry in remaining {
            println!(
                "  {}  {} bytes  modified {}",
                entry.path.display(),
                entry.size,
                entry.modified.format("%Y-%m-%d %H:%M:%S")
            );
        }

        Ok(())
    }
}

async fn validate_config_file(config_path: PathBuf) -> anyhow::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config_content = tokio::fs::read_to_string(&config_path).await?;
    let config: Config = serde_json::from_str(&config_content)?;
    crate::validate_config(&config)?;

    println!("Configuration is valid:");
    println!("  Listen port: {}", config.listen_port);
    println!("  Storage root: {}", config.storage_root.display());
    println!("  Dictionary: {}", config.dictionary_path.display());
    println!("  Retention: {:?}", config.retention);
    println!("  Max concurrent pages: {}", config.max_concurrent_pages);

    Ok(())
}

pub fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    info!("Logging initialized");
    Ok(())
}
