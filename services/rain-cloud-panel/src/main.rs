//! Rain cloud panel renderer.
//!
//! Renders the panel once and writes it as PNG. A degraded (error) panel is
//! still written and the process exits successfully.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use radar_browser::ChromeSessionFactory;
use radar_common::AppConfig;
use rain_cloud_panel::{FrameComposer, LogNotifier, Notifier, RetrySupervisor, SlackNotifier};
use renderer::{encode_panel, FaceMap, PngColorMode};

#[derive(Parser, Debug)]
#[command(name = "rain-cloud-panel")]
#[command(about = "Render the current and +1h rain cloud radar panel")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "RAIN_CLOUD_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "rain_cloud_panel.png")]
    output: PathBuf,

    /// Write 8-bit grayscale instead of RGBA
    #[arg(long)]
    grayscale: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    config.validate()?;
    info!(config = %args.config.display(), "Loaded configuration");

    let faces = Arc::new(FaceMap::load(&config.font));

    let notifier: Arc<dyn Notifier> = match &config.slack {
        Some(slack) => {
            let stamp = config
                .rain_cloud
                .cache
                .path
                .with_file_name("slack_error.stamp");
            Arc::new(SlackNotifier::new(slack.clone())?.with_stamp_file(stamp))
        }
        None => Arc::new(LogNotifier),
    };

    let factory = Arc::new(ChromeSessionFactory::new(
        config.browser.clone(),
        config.rain_cloud.timing.element_timeout(),
    ));

    let composer = FrameComposer::new(
        config.rain_cloud.clone(),
        Arc::clone(&faces),
        factory,
        notifier,
    );
    let supervisor = RetrySupervisor::new(composer, &config.rain_cloud, faces);

    let result = supervisor.produce().await;

    let mode = if args.grayscale {
        PngColorMode::Grayscale
    } else {
        PngColorMode::Rgba
    };
    let png = encode_panel(&result.image, mode)?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.output, &png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if result.is_degraded() {
        warn!(output = %args.output.display(), "Wrote error panel");
    }
    info!(
        output = %args.output.display(),
        bytes = png.len(),
        "elapsed time: {:.3} sec",
        result.elapsed.as_secs_f64()
    );

    Ok(())
}
