//! `storegeo resolve` handler.
//!
//! Reads store records, builds the Overpass and Nominatim clients from
//! config, and runs the batch resolver. Per-store outcomes go to stdout as
//! JSON lines; logs go to stderr.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use storegeo_core::{load_brands, store_key, AppConfig, BrandsFile, ConfigError, StoreQuery};
use storegeo_nominatim::NominatimClient;
use storegeo_overpass::OverpassClient;
use storegeo_resolver::{
    resolve_batch, BatchOptions, BatchOutcome, BatchSummary, ResolverSettings, TieredResolver,
};

/// One input record: an optional caller-supplied id plus the store fields.
#[derive(Debug, Deserialize)]
pub(crate) struct StoreRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    query: StoreQuery,
}

impl StoreRecord {
    fn into_item(self) -> (String, StoreQuery) {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => store_key(&self.query),
        };
        (id, self.query)
    }
}

/// Read a JSON array of store records, assigning `store_key` ids where the
/// record has none.
pub(crate) fn read_store_records(path: &Path) -> anyhow::Result<Vec<(String, StoreQuery)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    let records: Vec<StoreRecord> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse store records in {}", path.display()))?;
    Ok(records.into_iter().map(StoreRecord::into_item).collect())
}

/// Load brand profiles, falling back to none when the file does not exist.
pub(crate) fn load_brand_profiles(path: &Path) -> anyhow::Result<BrandsFile> {
    match load_brands(path) {
        Ok(brands) => Ok(brands),
        Err(ConfigError::BrandsFileIo { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            tracing::warn!(
                path = %path.display(),
                "brands file not found, using default shop types only"
            );
            Ok(BrandsFile::default())
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn output_line(outcome: &BatchOutcome) -> serde_json::Value {
    serde_json::json!({
        "id": outcome.id,
        "resolution": outcome.report.resolution,
        "attempts": outcome.attempts,
    })
}

fn print_summary(summary: &BatchSummary) {
    eprintln!(
        "Run complete at {}: {} stores, {} poi, {} scraper, {} geocoded, {} unresolved ({} with POI lookup unavailable)",
        chrono::Utc::now().to_rfc3339(),
        summary.total,
        summary.poi,
        summary.scraper,
        summary.geocoded,
        summary.unresolved,
        summary.poi_unavailable,
    );
}

/// Resolve every record in `input` and print the outcomes.
///
/// When `dry_run` is `true` the input and brand file are validated and the
/// record count printed; no network request is made.
///
/// # Errors
///
/// Returns an error if the input or brands file cannot be read or parsed, or
/// a client cannot be constructed. Per-store failures end up as
/// `unresolved` lines, not errors.
pub(crate) async fn run_resolve(
    config: &AppConfig,
    input: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let items = read_store_records(input)?;
    let brands = load_brand_profiles(&config.brands_path)?;

    if dry_run {
        println!(
            "dry-run: would resolve {} store(s) with {} brand profile(s)",
            items.len(),
            brands.brands.len()
        );
        for (id, query) in &items {
            println!("  {id}  {}, {}", query.name, query.city);
        }
        return Ok(());
    }

    if items.is_empty() {
        anyhow::bail!("no store records in {}", input.display());
    }

    let overpass =
        OverpassClient::from_config(config).context("failed to build Overpass client")?;
    let nominatim =
        NominatimClient::from_config(config).context("failed to build Nominatim client")?;
    let resolver = TieredResolver::new(
        overpass,
        nominatim,
        brands,
        ResolverSettings::from(config),
    );

    tracing::info!(stores = items.len(), "resolving stores");
    let (outcomes, summary) = resolve_batch(&resolver, &items, &BatchOptions::from(config)).await;

    let mut stdout = std::io::stdout().lock();
    for outcome in &outcomes {
        writeln!(stdout, "{}", output_line(outcome))?;
    }
    stdout.flush()?;

    print_summary(&summary);
    tracing::info!(
        overpass_queries = resolver.poi_source().queries_issued(),
        overpass_remaining = resolver.poi_source().remaining_budget(),
        "overpass budget"
    );

    Ok(())
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
