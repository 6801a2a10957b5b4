// Result Selector - cheapest players first
//
// Rows without a price per TP are dropped. The sort is stable: rows with the
// same price per TP keep the order they came in (merge order). Keys are finite,
// and 0.0 and -0.0 compare equal.

use std::cmp::Ordering;

use crate::metrics::ComputedRow;

pub fn select(rows: Vec<ComputedRow>) -> Vec<ComputedRow> {
    let mut ranked: Vec<(f64, ComputedRow)> = rows
        .into_iter()
        .filter_map(|row| row.price_per_tp.map(|key| (key, row)))
        .collect();

    ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    ranked.into_iter().map(|(_, row)| row).collect()
}
