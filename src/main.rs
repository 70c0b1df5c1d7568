//! CLI entry point for hue-panel.
//!
//! # Usage
//!
//! ```bash
//! hue-panel gui <username> <group>
//! ```
//!
//! `username` is the API token registered on the bridge, `group` the number
//! of the light group to control. The panel runs fullscreen; `Q` or
//! `Escape` quits.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use eframe::egui;
use hue_panel::bridge::hue::HueConnector;
use hue_panel::gui::PanelGui;
use hue_panel::panel::session::GroupSession;
use std::sync::{Arc, RwLock};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hue-panel")]
#[command(about = "Control panel for a group of Philips Hue lights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fullscreen panel for one light group
    Gui {
        /// Bridge username (API token)
        username: String,
        /// Group number to control
        group: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Gui { username, group } => run_gui(username, group),
    }
}

fn run_gui(username: String, group: u32) -> Result<()> {
    info!(group, "starting panel");

    let runtime = tokio::runtime::Runtime::new()?;
    let handle = runtime.handle().clone();

    let connector = Arc::new(HueConnector::new()?);
    let session = Arc::new(RwLock::new(GroupSession::new(username, group)));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Hue Panel")
            .with_fullscreen(true),
        ..Default::default()
    };

    eframe::run_native(
        "Hue Panel",
        options,
        Box::new(move |cc| Ok(Box::new(PanelGui::new(cc, session, connector, handle)))),
    )
    .map_err(|e| anyhow!("render loop failed: {e}"))?;

    info!("panel closed");
    Ok(())
}
