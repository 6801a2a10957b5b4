// 🖼️ Rendering - fixed-precision display rows, text table, HTML page
//
// Precision: price 8 dp, balances/market cap 2 dp, TP 4 dp, price per TP 6 dp.
// Absent values render as "N/A" and never as 0.

use serde::Serialize;

use crate::metrics::ComputedRow;
use crate::pipeline::PipelineReport;

pub const ABSENT: &str = "N/A";

/// Column headers, in display order
pub const COLUMNS: [&str; 6] = [
    "Name",
    "Price (USD)",
    "Circulating",
    "TP (off-season)",
    "Market Cap",
    "Price / TP",
];

// ============================================================================
// DISPLAY ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub name: String,
    pub price_usd: String,
    pub circulating_balance: String,
    pub tp_off_season: String,
    pub market_cap: String,
    pub price_per_tp: String,
}

impl DisplayRow {
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.name,
            &self.price_usd,
            &self.circulating_balance,
            &self.tp_off_season,
            &self.market_cap,
            &self.price_per_tp,
        ]
    }
}

impl From<&ComputedRow> for DisplayRow {
    fn from(row: &ComputedRow) -> Self {
        Self {
            name: row.name.clone(),
            price_usd: format!("{:.8}", row.price_usd),
            circulating_balance: format!("{:.2}", row.circulating_balance),
            tp_off_season: optional(row.tp_off_season, 4),
            market_cap: format!("{:.2}", row.market_cap),
            price_per_tp: optional(row.price_per_tp, 6),
        }
    }
}

fn optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => ABSENT.to_string(),
    }
}

/// Raw sort keys per column; absent numbers have no key
fn sort_keys(row: &ComputedRow) -> [Option<f64>; 6] {
    [
        None,
        Some(row.price_usd),
        Some(row.circulating_balance),
        row.tp_off_season,
        Some(row.market_cap),
        row.price_per_tp,
    ]
}

// ============================================================================
// PLAIN TEXT
// ============================================================================

/// Aligned plain-text table for terminals and logs
pub fn render_text(rows: &[ComputedRow]) -> String {
    let display: Vec<DisplayRow> = rows.iter().map(DisplayRow::from).collect();

    let mut widths = COLUMNS.map(|c| c.len());
    for row in &display {
        for (i, cell) in row.cells().iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_text_line(&mut out, &COLUMNS, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule_refs: Vec<&str> = rule.iter().map(String::as_str).collect();
    push_text_line(&mut out, &rule_refs, &widths);

    for row in &display {
        push_text_line(&mut out, &row.cells(), &widths);
    }

    out
}

fn push_text_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            if i == 0 {
                format!("{:<width$}", cell, width = *width)
            } else {
                format!("{:>width$}", cell, width = *width)
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

// ============================================================================
// HTML
// ============================================================================

const PAGE_TEMPLATE: &str = include_str!("../web/index.html");

/// Standalone HTML page with a click-to-sort table
pub fn render_html(report: &PipelineReport) -> String {
    let mut body = String::new();

    for row in &report.rows {
        let display = DisplayRow::from(row);
        body.push_str("<tr>");
        for (i, (cell, key)) in display.cells().iter().zip(sort_keys(row)).enumerate() {
            let attr = match key {
                Some(k) => format!(" data-sort=\"{}\"", k),
                None if i == 0 => String::new(),
                None => " data-absent=\"1\"".to_string(),
            };
            body.push_str(&format!("<td{}>{}</td>", attr, escape_html(cell)));
        }
        body.push_str("</tr>\n");
    }

    let header: String = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| format!("<th data-col=\"{}\">{}</th>", i, escape_html(c)))
        .collect();

    PAGE_TEMPLATE
        .replace("{{summary}}", &escape_html(&report.summary()))
        .replace("{{generated_at}}", &report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .replace("{{header}}", &header)
        .replace("{{rows}}", &body)
}

/// Error page shown instead of a table when a run fails
pub fn render_error_html(message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>TP Value</title></head>\
         <body><h1>Data unavailable</h1><p>{}</p></body></html>",
        escape_html(message)
    )
}

pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// TESTS
// ============================================================================
