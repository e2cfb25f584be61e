mod app;
mod convert;
mod panels;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fastraw", about = "Fast RAW image viewer with progressive loading")]
#[command(version)]
struct Cli {
    /// RAW file to open on startup
    file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("fastraw"),
        ..Default::default()
    };

    let startup = cli.file;
    eframe::run_native(
        "fastraw",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(app::FastRawApp::new(&cc.egui_ctx, startup)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Viewer failed: {e}"))
}
