// 🪙 Holdings Merger - Main pool + market pool → one record per token
//
// Both wallets report the same kind of row: a token address, the token's
// metadata (name, USD price) and the balance the wallet holds. A player token
// can sit in either wallet, both, or neither, so the merge is keyed by
// address and a missing side simply means a zero balance.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{NumberError, PipelineError};

/// Display name used when a row carries no token name
pub const UNKNOWN_NAME: &str = "Unknown";

/// Keys under which an object-shaped snapshot may carry its rows
const ROW_CONTAINER_KEYS: &[&str] = &["items", "data", "result"];

// ============================================================================
// POOL
// ============================================================================

/// Which wallet a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    Main,
    Market,
}

impl Pool {
    pub fn name(&self) -> &str {
        match self {
            Pool::Main => "main pool",
            Pool::Market => "market pool",
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// HOLDING RECORD (one snapshot row, defaults applied)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    pub address: String,
    pub name: String,
    pub price_usd: f64,
    pub balance: f64,
}

impl HoldingRecord {
    pub fn new(address: &str, name: &str, price_usd: f64, balance: f64) -> Self {
        HoldingRecord {
            address: address.to_string(),
            name: name.to_string(),
            price_usd,
            balance,
        }
    }
}

/// Row keys that may carry the token address, in lookup order
const ADDRESS_KEYS: &[&str] = &["token_address", "address"];

/// Parse a numeric field that may arrive as a JSON number or a numeric string
///
/// Only finite values are accepted. Callers decide the default on failure.
pub fn parse_decimal(value: &Value) -> Result<f64, NumberError> {
    let parsed = match value {
        Value::Null => return Err(NumberError::Absent),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| NumberError::NotNumeric(n.to_string()))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| NumberError::NotNumeric(s.clone()))?,
        other => return Err(NumberError::NotNumeric(other.to_string())),
    };

    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(NumberError::NotFinite)
    }
}

fn decimal_or_zero(value: &Value, field: &str, address: &str) -> f64 {
    parse_decimal(value).unwrap_or_else(|e| {
        debug!(address, field, error = %e, "coercing field to 0");
        0.0
    })
}

/// Parse one fetched snapshot document into holding records
///
/// Accepts a bare array of rows or an object carrying them under
/// `items` / `data` / `result`. Any other shape is a malformed snapshot.
/// Only rows without a usable address are skipped.
pub fn parse_snapshot(pool: Pool, document: &Value) -> Result<Vec<HoldingRecord>, PipelineError> {
    let rows = snapshot_rows(document).ok_or_else(|| PipelineError::MalformedSnapshot {
        pool,
        reason: "expected an array of rows or an object with items/data/result".to_string(),
    })?;

    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let address = match row_address(row) {
            Some(address) => address,
            None => {
                warn!(%pool, index, "skipping snapshot row without token address");
                continue;
            }
        };

        // Metadata of the wrong type falls back to defaults, never drops the row
        let token = row.get("token");
        let name = token
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_NAME)
            .to_string();
        let price_usd = decimal_or_zero(
            token.and_then(|t| t.get("price_usd")).unwrap_or(&Value::Null),
            "price_usd",
            &address,
        );
        let balance = decimal_or_zero(
            row.get("balance").unwrap_or(&Value::Null),
            "balance",
            &address,
        );

        records.push(HoldingRecord {
            address,
            name,
            price_usd,
            balance,
        });
    }

    Ok(records)
}

/// First non-blank string address on the row, then on its token metadata
fn row_address(row: &Value) -> Option<String> {
    let token = row.get("token");
    ADDRESS_KEYS
        .iter()
        .filter_map(|key| row.get(*key))
        .chain(token.and_then(|t| t.get("address")))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|address| !address.is_empty())
        .map(str::to_string)
}

fn snapshot_rows(document: &Value) -> Option<&Vec<Value>> {
    match document {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => ROW_CONTAINER_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

// ============================================================================
// MERGED ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntity {
    pub address: String,
    pub name: String,
    pub price_usd: f64,
    pub main_balance: f64,
    pub market_balance: f64,
}

impl MergedEntity {
    pub fn pooled_balance(&self) -> f64 {
        self.main_balance + self.market_balance
    }
}

/// A snapshot row tagged with the wallet it came from
#[derive(Debug, Clone, PartialEq)]
pub enum PoolRow {
    Main(HoldingRecord),
    Market(HoldingRecord),
}

/// Merged entities keyed by address, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct MergedHoldings {
    entities: Vec<MergedEntity>,
    index: HashMap<String, usize>,
}

impl MergedHoldings {
    /// Fold one tagged row into the merge
    ///
    /// Main rows (re)create the entity with a zero market balance.
    /// Market rows only touch the market balance of a known address, or
    /// create a market-only entity for an unseen one.
    /// All main rows must be applied before any market row.
    pub fn apply(&mut self, row: PoolRow) {
        match row {
            PoolRow::Main(record) => {
                let entity = MergedEntity {
                    address: record.address.clone(),
                    name: record.name,
                    price_usd: record.price_usd,
                    main_balance: record.balance,
                    market_balance: 0.0,
                };
                match self.index.get(&record.address) {
                    Some(&i) => self.entities[i] = entity,
                    None => self.push(entity),
                }
            }
            PoolRow::Market(record) => match self.index.get(&record.address) {
                Some(&i) => self.entities[i].market_balance = record.balance,
                None => self.push(MergedEntity {
                    address: record.address,
                    name: record.name,
                    price_usd: record.price_usd,
                    main_balance: 0.0,
                    market_balance: record.balance,
                }),
            },
        }
    }

    fn push(&mut self, entity: MergedEntity) {
        self.index.insert(entity.address.clone(), self.entities.len());
        self.entities.push(entity);
    }

    pub fn get(&self, address: &str) -> Option<&MergedEntity> {
        self.index.get(address).map(|&i| &self.entities[i])
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedEntity> {
        self.entities.iter()
    }
}

/// Merge the main-pool and market-pool snapshots
///
/// Every address from either side ends up in exactly one entity. Name and
/// price come from the main pool when it has the address.
pub fn merge<M, K>(main_rows: M, market_rows: K) -> MergedHoldings
where
    M: IntoIterator<Item = HoldingRecord>,
    K: IntoIterator<Item = HoldingRecord>,
{
    main_rows
        .into_iter()
        .map(PoolRow::Main)
        .chain(market_rows.into_iter().map(PoolRow::Market))
        .fold(MergedHoldings::default(), |mut merged, row| {
            merged.apply(row);
            merged
        })
}

// ============================================================================
// TESTS
// ============================================================================
