use chrono::Utc;
use futures::future::join_all;
use serde::Deserialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_msp_screener::config::Config;
use rust_msp_screener::distance::{CachedDistanceResolver, PostcodeGeocoder};
use rust_msp_screener::errors::{AppError, ResultExt};
use rust_msp_screener::models::{AnnualFinancialRecord, CompanyRecord};
use rust_msp_screener::screening::{rank_reports, screen_company, ScreeningReport};

/// One input file: a company and its extracted annual financials.
#[derive(Debug, Deserialize)]
struct ScreeningInput {
    company: CompanyRecord,
    #[serde(default)]
    financials: Vec<AnnualFinancialRecord>,
}

async fn load_input(path: &PathBuf) -> Result<ScreeningInput, AppError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&raw)
        .map_err(AppError::from)
        .with_context(|| format!("Invalid screening input in {}", path.display()))
}

/// Main entry point for the screening CLI.
///
/// Usage: `rust-msp-screener <company.json>...`
///
/// Each file holds `{ "company": ..., "financials": [...] }`. All companies are
/// screened concurrently against a shared cache-first postcode geocoder, then
/// ranked and printed as JSON. Unreadable files are logged and skipped.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok once the ranked report has been printed.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_msp_screener=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        anyhow::bail!("Usage: rust-msp-screener <company.json>...");
    }

    let config = Config::from_env()?;

    let geocoder = PostcodeGeocoder::from_config(&config)?;
    let resolver = CachedDistanceResolver::new(
        geocoder,
        config.distance_cache_ttl(),
        config.distance_cache_capacity,
    );
    tracing::info!(
        "Distance resolver ready (reference: {}, geocoder: {}, cache TTL: {}s)",
        config.reference_label,
        config.postcodes_base_url,
        config.distance_cache_ttl_secs
    );

    let mut inputs = Vec::new();
    for path in &paths {
        match load_input(path).await {
            Ok(input) => inputs.push(input),
            Err(e) => tracing::error!("✗ Skipping {}: {}", path.display(), e),
        }
    }

    if inputs.is_empty() {
        anyhow::bail!("No valid screening inputs");
    }

    let as_of = Utc::now();
    let mut reports: Vec<ScreeningReport> = join_all(inputs.iter().map(|input| {
        screen_company(&input.company, &input.financials, &resolver, as_of)
    }))
    .await;

    rank_reports(&mut reports);

    tracing::info!(
        "✓ Screened {} compan{}, {} matching the thesis",
        reports.len(),
        if reports.len() == 1 { "y" } else { "ies" },
        reports.iter().filter(|r| r.thesis.matches).count()
    );

    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(())
}
