// TP Value - Core Library
// Exposes the pipeline for the CLI, the web server, and tests

pub mod config;
pub mod error;
pub mod fetch;
pub mod holdings;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod reference;
pub mod render;
pub mod selector;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{ConfigError, FetchError, NumberError, PipelineError};
pub use fetch::{HttpFetcher, JsonFetcher, StaticFetcher};
pub use holdings::{
    merge, parse_decimal, parse_snapshot,
    HoldingRecord, MergedEntity, MergedHoldings, Pool, PoolRow,
};
pub use metrics::{compute, ComputedRow};
pub use normalize::normalize;
pub use pipeline::{reconcile, Pipeline, PipelineReport};
pub use reference::TpReference;
pub use render::{render_html, render_text, DisplayRow};
pub use selector::select;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
