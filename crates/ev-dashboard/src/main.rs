//! Main application entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use eframe::egui;
use ev_core::DashboardConfig;
use ev_data::{CachingSource, DataSource, DemoSource, HttpSource, PayloadCache};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod paint;

use app::DashboardApp;

/// Earned-value dashboard
#[derive(Debug, Parser)]
#[command(name = "ev-dashboard")]
#[command(author, version, about = "Earned-value project dashboard")]
struct Args {
    /// Dashboard config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve synthetic data instead of calling the backend
    #[arg(long)]
    demo: bool,
}

fn load_config(args: &Args) -> Result<DashboardConfig> {
    let config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => {
            let mut config = DashboardConfig::default();
            config.apply_env();
            config
        }
    };
    Ok(config)
}

/// Pick the data source; the cache handle is kept for manual refreshes
fn build_source(args: &Args, config: &DashboardConfig) -> (Arc<dyn DataSource>, Option<PayloadCache>) {
    if args.demo {
        info!("Using demo data");
        let demo: Arc<dyn DataSource> =
            Arc::new(DemoSource::new().with_latency(Duration::from_millis(300)));
        return (demo, None);
    }

    let http = HttpSource::from_config(config);
    info!(base_url = %config.api_base_url, "Using backend");
    if !config.cache_enabled {
        return (Arc::new(http) as Arc<dyn DataSource>, None);
    }

    let cache = PayloadCache::default();
    let cached: Arc<dyn DataSource> = Arc::new(CachingSource::new(http, cache.clone()));
    (cached, Some(cache))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Initialize tracing; RUST_LOG wins over the config's debug flag
    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let (source, cache) = build_source(&args, &config);
    let runtime = tokio::runtime::Runtime::new()?;

    info!("Starting EV dashboard");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([480.0, 360.0]),
        default_theme: eframe::Theme::Light,
        ..Default::default()
    };

    eframe::run_native(
        "EV Dashboard",
        options,
        Box::new(move |cc| Box::new(DashboardApp::new(cc, config, runtime, source, cache))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
