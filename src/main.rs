// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::env;
use tracing_subscriber::EnvFilter;

use tp_value::render::render_text;
use tp_value::{HttpFetcher, Pipeline, PipelineConfig, PipelineReport};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("ui");

    if !matches!(command, "ui" | "table" | "json" | "unmatched") {
        eprintln!("Usage: tp-value [ui|table|json|unmatched]");
        std::process::exit(2);
    }

    let report = match load_report().await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    match command {
        "table" => print_table(&report),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "unmatched" => print_unmatched(&report),
        _ => run_ui_mode(report)?,
    }

    Ok(())
}

async fn load_report() -> Result<PipelineReport> {
    let config = PipelineConfig::from_env().context("Invalid configuration")?;
    let fetcher = HttpFetcher::new(config.fetch_timeout).context("Failed to create HTTP client")?;

    let report = Pipeline::new(config, fetcher)
        .run()
        .await
        .context("Failed to build TP ranking")?;

    Ok(report)
}

fn print_table(report: &PipelineReport) {
    println!("📊 Price per TP: {}", report.summary());
    println!();
    print!("{}", render_text(&report.rows));
}

fn print_unmatched(report: &PipelineReport) {
    if report.unmatched.is_empty() {
        println!("✓ Every token matched the TP reference");
        return;
    }

    println!("⚠️  {} tokens without a TP reference match:", report.unmatched.len());
    for name in &report.unmatched {
        println!("   {}", name);
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(report: PipelineReport) -> Result<()> {
    let mut app = ui::App::new(report);
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(report: PipelineReport) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Showing plain table instead.\n");
    print_table(&report);
    Ok(())
}
