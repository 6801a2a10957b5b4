// ⚙️ TP Pipeline - fetch → merge → compute → select
//
// Each run starts from scratch: both wallet snapshots and the reference table
// are loaded, then the synchronous core produces the ranked rows. Any fetch or
// file failure aborts the run; there is never a partial table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fetch::JsonFetcher;
use crate::holdings::{merge, parse_snapshot, Pool};
use crate::metrics::{compute, ComputedRow};
use crate::reference::{self, TpReference};
use crate::selector::select;

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Ranked rows, cheapest price per TP first
    pub rows: Vec<ComputedRow>,

    /// Entities after merging both pools
    pub entity_count: usize,

    /// Entities whose name matched the reference table
    pub matched_count: usize,

    /// Display names without a reference match, in merge order
    pub unmatched: Vec<String>,

    pub reference_size: usize,
    pub total_supply: f64,
    pub generated_at: DateTime<Utc>,
}

impl PipelineReport {
    pub fn summary(&self) -> String {
        format!(
            "{} ranked of {} tokens ({} matched, {} unmatched, {} reference players)",
            self.rows.len(),
            self.entity_count,
            self.matched_count,
            self.unmatched.len(),
            self.reference_size
        )
    }
}

// ============================================================================
// CORE
// ============================================================================

/// Synchronous core on already-loaded inputs
pub fn reconcile(
    main_document: &Value,
    market_document: &Value,
    reference: &TpReference,
    total_supply: f64,
) -> Result<PipelineReport, PipelineError> {
    let main_rows = parse_snapshot(Pool::Main, main_document)?;
    let market_rows = parse_snapshot(Pool::Market, market_document)?;

    let merged = merge(main_rows, market_rows);
    let computed = compute(&merged, reference, total_supply);

    let unmatched: Vec<String> = computed
        .iter()
        .filter(|row| !row.has_tp_match())
        .map(|row| row.name.clone())
        .collect();
    let matched_count = computed.len() - unmatched.len();
    let entity_count = computed.len();

    let rows = select(computed);

    Ok(PipelineReport {
        rows,
        entity_count,
        matched_count,
        unmatched,
        reference_size: reference.len(),
        total_supply,
        generated_at: Utc::now(),
    })
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline<F: JsonFetcher> {
    config: PipelineConfig,
    fetcher: F,
}

impl<F: JsonFetcher> Pipeline<F> {
    pub fn new(config: PipelineConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one full invocation
    ///
    /// Both snapshots and the reference file are loaded concurrently; the
    /// first failure wins and nothing is computed.
    pub async fn run(&self) -> Result<PipelineReport, PipelineError> {
        let main_url = self.config.snapshot_url(&self.config.main_pool_url);
        let market_url = self.config.snapshot_url(&self.config.market_pool_url);

        let (main_document, market_document, reference) = tokio::try_join!(
            self.fetch_snapshot(Pool::Main, &main_url),
            self.fetch_snapshot(Pool::Market, &market_url),
            reference::load_file(&self.config.tp_reference_path),
        )?;

        let report = reconcile(&main_document, &market_document, &reference, self.config.total_supply)?;
        info!("{}", report.summary());

        Ok(report)
    }

    async fn fetch_snapshot(&self, pool: Pool, resource: &str) -> Result<Value, PipelineError> {
        self.fetcher
            .fetch_json(resource)
            .await
            .map_err(|source| PipelineError::SnapshotUnavailable { pool, source })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use serde_json::json;

    fn bob_main() -> Value {
        json!([{"token_address": "0xA", "token": {"name": "Bob", "price_usd": 2}, "balance": 10}])
    }

    fn bob_market() -> Value {
        json!([{"token_address": "0xA", "token": {"name": "BOBBY", "price_usd": 2}, "balance": 5}])
    }

    #[test]
    fn test_reconcile_end_to_end() {
        let reference = reference::load("name,tp\nbob,20\n");
        let report = reconcile(&bob_main(), &bob_market(), &reference, 100.0).unwrap();

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.name, "Bob");
        assert_eq!(row.circulating_balance, 85.0);
        assert_eq!(row.market_cap, 170.0);
        assert_eq!(row.tp_off_season, Some(20.0));
        assert_eq!(row.price_per_tp, Some(8.5));

        assert_eq!(report.entity_count, 1);
        assert_eq!(report.matched_count, 1);
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn test_reconcile_no_match_excluded() {
        let reference = reference::load("name,tp\nalice,20\n");
        let report = reconcile(&bob_main(), &bob_market(), &reference, 100.0).unwrap();

        assert!(report.rows.is_empty());
        assert_eq!(report.entity_count, 1);
        assert_eq!(report.matched_count, 0);
        assert_eq!(report.unmatched, vec!["Bob".to_string()]);
    }

    #[test]
    fn test_reconcile_malformed_snapshot() {
        let reference = TpReference::default();
        let result = reconcile(&bob_main(), &json!({"oops": true}), &reference, 100.0);

        assert!(matches!(
            result,
            Err(PipelineError::MalformedSnapshot { pool: Pool::Market, .. })
        ));
    }

    #[tokio::test]
    async fn test_run_fails_when_snapshot_missing() {
        let config = PipelineConfig::new("main", "market", "unused.csv", 100.0);
        let main_url = config.snapshot_url("main");
        let fetcher = StaticFetcher::new().with_document(main_url, bob_main());

        let result = Pipeline::new(config, fetcher).run().await;

        assert!(matches!(
            result,
            Err(PipelineError::SnapshotUnavailable { pool: Pool::Market, .. })
                | Err(PipelineError::ReferenceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_fails_when_reference_missing() {
        let config = PipelineConfig::new("main", "market", "/no/such/dir/tp.csv", 100.0);
        let fetcher = StaticFetcher::new()
            .with_document(config.snapshot_url("main"), bob_main())
            .with_document(config.snapshot_url("market"), bob_market());

        let result = Pipeline::new(config, fetcher).run().await;

        assert!(matches!(result, Err(PipelineError::ReferenceUnavailable { .. })));
    }
}
