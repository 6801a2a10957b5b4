// 📈 Metric Calculator - Circulating supply, market cap, price per TP
//
// Formula per token:
//   circulating  = total_supply - (main_balance + market_balance)
//   market_cap   = price_usd * circulating
//   price_per_tp = market_cap / tp        (only when tp > 0)

use serde::{Deserialize, Serialize};

use crate::holdings::{MergedEntity, MergedHoldings};
use crate::normalize::normalize;
use crate::reference::TpReference;

// ============================================================================
// COMPUTED ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedRow {
    pub address: String,
    pub name: String,
    pub price_usd: f64,

    /// Can go negative when the pools hold more than the configured supply
    pub circulating_balance: f64,

    /// TP value from the reference table (None = no match)
    pub tp_off_season: Option<f64>,

    pub market_cap: f64,

    /// None when there is no TP match or the TP is not positive
    pub price_per_tp: Option<f64>,
}

impl ComputedRow {
    pub fn has_tp_match(&self) -> bool {
        self.tp_off_season.is_some()
    }
}

// ============================================================================
// CALCULATOR
// ============================================================================

/// Compute one row per merged entity, in merge order
pub fn compute(entities: &MergedHoldings, reference: &TpReference, total_supply: f64) -> Vec<ComputedRow> {
    entities
        .iter()
        .map(|entity| compute_row(entity, reference, total_supply))
        .collect()
}

/// Compute metrics for a single entity
pub fn compute_row(entity: &MergedEntity, reference: &TpReference, total_supply: f64) -> ComputedRow {
    let circulating_balance = total_supply - entity.pooled_balance();
    let market_cap = entity.price_usd * circulating_balance;

    let tp_off_season = reference.get(&normalize(&entity.name));

    ComputedRow {
        address: entity.address.clone(),
        name: entity.name.clone(),
        price_usd: entity.price_usd,
        circulating_balance,
        tp_off_season,
        market_cap,
        price_per_tp: price_per_tp(market_cap, tp_off_season),
    }
}

/// market_cap / tp, or None when there is no usable TP
///
/// Zero and negative TP values are treated as unusable.
pub fn price_per_tp(market_cap: f64, tp: Option<f64>) -> Option<f64> {
    match tp {
        Some(tp) if tp > 0.0 => Some(market_cap / tp),
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::{merge, HoldingRecord};

    fn entity(name: &str, price: f64, main: f64, market: f64) -> MergedEntity {
        MergedEntity {
            address: format!("0x{}", name.len()),
            name: name.to_string(),
            price_usd: price,
            main_balance: main,
            market_balance: market,
        }
    }

    fn reference(entries: &[(&str, f64)]) -> TpReference {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_compute_row_basic() {
        let row = compute_row(&entity("Bob", 2.0, 10.0, 5.0), &reference(&[("bob", 20.0)]), 100.0);

        assert_eq!(row.circulating_balance, 85.0);
        assert_eq!(row.market_cap, 170.0);
        assert_eq!(row.tp_off_season, Some(20.0));
        assert_eq!(row.price_per_tp, Some(8.5));
        assert!(row.has_tp_match());
    }

    #[test]
    fn test_no_match_gives_absent_tp() {
        let row = compute_row(&entity("Bob", 2.0, 10.0, 5.0), &reference(&[("ann", 20.0)]), 100.0);

        assert_eq!(row.tp_off_season, None);
        assert_eq!(row.price_per_tp, None);
        assert_eq!(row.market_cap, 170.0);
        assert!(!row.has_tp_match());
    }

    #[test]
    fn test_zero_and_negative_tp_guarded() {
        let zero = compute_row(&entity("Zed", 2.0, 0.0, 0.0), &reference(&[("zed", 0.0)]), 10.0);
        assert_eq!(zero.tp_off_season, Some(0.0));
        assert_eq!(zero.price_per_tp, None);

        let negative = compute_row(&entity("Neg", 2.0, 0.0, 0.0), &reference(&[("neg", -5.0)]), 10.0);
        assert_eq!(negative.tp_off_season, Some(-5.0));
        assert_eq!(negative.price_per_tp, None);
    }

    #[test]
    fn test_negative_circulating_not_clamped() {
        let row = compute_row(&entity("Bob", 2.0, 80.0, 40.0), &reference(&[("bob", 4.0)]), 100.0);

        assert_eq!(row.circulating_balance, -20.0);
        assert_eq!(row.market_cap, -40.0);
        assert_eq!(row.price_per_tp, Some(-10.0));
    }

    #[test]
    fn test_name_normalized_for_lookup() {
        let row = compute_row(
            &entity("Christiian  O'Neil!", 1.0, 0.0, 0.0),
            &reference(&[("Christian ONeil", 5.0)]),
            10.0,
        );

        assert_eq!(row.tp_off_season, Some(5.0));
        assert_eq!(row.price_per_tp, Some(2.0));
    }

    #[test]
    fn test_compute_one_row_per_entity_in_order() {
        let merged = merge(
            vec![
                HoldingRecord::new("0xA", "Bob", 1.0, 0.0),
                HoldingRecord::new("0xB", "Bob", 2.0, 0.0),
            ],
            vec![HoldingRecord::new("0xC", "Nobody", 1.0, 0.0)],
        );

        let rows = compute(&merged, &reference(&[("bob", 10.0)]), 10.0);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].address, "0xA");
        assert_eq!(rows[1].address, "0xB");
        assert_eq!(rows[2].address, "0xC");

        // Same normalized name on two addresses: both get the TP
        assert_eq!(rows[0].price_per_tp, Some(1.0));
        assert_eq!(rows[1].price_per_tp, Some(2.0));
        assert_eq!(rows[2].price_per_tp, None);
    }

    #[test]
    fn test_price_per_tp_helper() {
        assert_eq!(price_per_tp(10.0, Some(4.0)), Some(2.5));
        assert_eq!(price_per_tp(10.0, Some(0.0)), None);
        assert_eq!(price_per_tp(10.0, Some(-1.0)), None);
        assert_eq!(price_per_tp(10.0, None), None);
    }
}
