use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use sales_insights::app::SalesInsightsApp;
use sales_insights::config::{Args, Settings};
use sales_insights::dashboard::DashboardReport;
use sales_insights::data::loader::load_file;
use sales_insights::state::AppState;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::from(&args);

    if args.report {
        let path = args.path.as_deref().context("--report needs a PATH")?;
        let table = load_file(path).with_context(|| format!("loading {}", path.display()))?;
        let report = DashboardReport::with_defaults(&table, &settings);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut state = AppState::new(settings);
    if let Some(path) = &args.path {
        state.open(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Insights",
        options,
        Box::new(|_cc| Ok(Box::new(SalesInsightsApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}
