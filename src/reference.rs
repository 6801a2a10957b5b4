// 📋 Reference Table Loader - Player TP values from CSV
//
// Format: header line, then `name,value` lines. The table is maintained by
// hand, so bad lines are skipped instead of failing the whole load.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::normalize::normalize;

/// Normalized player name → TP value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TpReference {
    values: HashMap<String, f64>,
}

impl TpReference {
    /// Look up a TP value by raw display name (normalized here)
    pub fn lookup(&self, display_name: &str) -> Option<f64> {
        self.values.get(&normalize(display_name)).copied()
    }

    /// Look up a TP value by an already-normalized name
    pub fn get(&self, normalized_name: &str) -> Option<f64> {
        self.values.get(normalized_name).copied()
    }

    /// Insert under the normalized form of `name`; later inserts win
    pub fn insert(&mut self, name: &str, tp: f64) -> Option<f64> {
        self.values.insert(normalize(name), tp)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for TpReference {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut reference = TpReference::default();
        for (name, tp) in iter {
            reference.insert(name, tp);
        }
        reference
    }
}

/// Parse raw reference CSV text
///
/// - First line is a header
/// - Fields are split on every comma (no quoting)
/// - Lines with fewer than 2 fields are skipped
/// - Lines whose TP is not a finite number are skipped
/// - Duplicate names: last line wins
pub fn load(raw_text: &str) -> TpReference {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(raw_text.as_bytes());

    let mut reference = TpReference::default();
    let mut skipped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line + 2, error = %e, "skipping unreadable reference line");
                skipped += 1;
                continue;
            }
        };

        let (Some(name), Some(tp_field)) = (record.get(0), record.get(1)) else {
            warn!(line = line + 2, "skipping reference line with fewer than two fields");
            skipped += 1;
            continue;
        };

        match tp_field.parse::<f64>() {
            Ok(tp) if tp.is_finite() => {
                reference.insert(name, tp);
            }
            _ => {
                warn!(line = line + 2, name, tp_field, "skipping reference line with invalid TP");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "reference lines skipped");
    }

    reference
}

/// Read and parse the reference file
///
/// A missing or unreadable file fails the pipeline; no retry.
pub async fn load_file(path: &Path) -> Result<TpReference, PipelineError> {
    let raw_text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PipelineError::ReferenceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    let reference = load(&raw_text);
    info!(path = %path.display(), players = reference.len(), "loaded TP reference");

    Ok(reference)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_basic() {
        let raw = "Player,TP\nBob,20\nChriss O'Brien,12.5\n";
        let reference = load(raw);

        assert_eq!(reference.len(), 2);
        assert_eq!(reference.get("bob"), Some(20.0));
        assert_eq!(reference.get("chriss obrien"), Some(12.5));
        assert_eq!(reference.lookup("CHRISS O'BRIEN"), Some(12.5));
    }

    #[test]
    fn test_header_discarded() {
        // Header looks like a valid data line but must not be loaded
        let raw = "Bob,20\nAnn,5\n";
        let reference = load(raw);

        assert_eq!(reference.len(), 1);
        assert_eq!(reference.get("bob"), None);
        assert_eq!(reference.get("ann"), Some(5.0));
    }

    #[test]
    fn test_short_and_bad_lines_skipped() {
        let raw = "name,value\nlonely\nBob,abc\nAnn,\nCat,inf\nDan, 7.25 \n\nEve,3,extra\n";
        let reference = load(raw);

        assert_eq!(reference.len(), 2);
        assert_eq!(reference.get("dan"), Some(7.25));
        assert_eq!(reference.get("eve"), Some(3.0));
        assert_eq!(reference.get("bob"), None);
        assert_eq!(reference.get("cat"), None);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_skipped_lines_logged_at_warn() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let reference = tracing::subscriber::with_default(subscriber, || {
            load("name,value\nlonely\nBob,abc\nAnn,5\n")
        });
        assert_eq!(reference.len(), 1);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("skipping reference line with fewer than two fields"));
        assert!(output.contains("skipping reference line with invalid TP"));
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let raw = "name,value\nBob,20\nBOB!,25\n  bob  ,30\n";
        let reference = load(raw);

        assert_eq!(reference.len(), 1);
        assert_eq!(reference.get("bob"), Some(30.0));
    }

    #[test]
    fn test_quotes_are_not_special() {
        let raw = "name,value\n\"Smith, Jr.\",4\nAl \"The Rock\" Jones,6\n";
        let reference = load(raw);

        // `"Smith` / ` Jr."` / `4` → TP field is ` Jr."` and fails to parse
        assert_eq!(reference.get("smith"), None);
        assert_eq!(reference.get("al the rock jones"), Some(6.0));
    }

    #[test]
    fn test_names_normalized() {
        let raw = "name,value\nChristiian Lee,8\n";
        let reference = load(raw);

        assert_eq!(reference.get("christian lee"), Some(8.0));
        assert_eq!(reference.lookup("Christian Lee"), Some(8.0));
    }

    #[test]
    fn test_zero_and_negative_tp_are_kept() {
        // The calculator decides these are unusable, not the loader
        let raw = "name,value\nZed,0\nNeg,-4\n";
        let reference = load(raw);

        assert_eq!(reference.get("zed"), Some(0.0));
        assert_eq!(reference.get("neg"), Some(-4.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(load("").is_empty());
        assert!(load("name,value\n").is_empty());
    }

    #[test]
    fn test_from_iter() {
        let reference: TpReference = vec![("Bob", 1.0), ("bob", 2.0)].into_iter().collect();
        assert_eq!(reference.len(), 1);
        assert_eq!(reference.get("bob"), Some(2.0));
    }

    #[tokio::test]
    async fn test_load_file_missing() {
        let path = Path::new("/definitely/not/here/tp_reference.csv");
        let result = load_file(path).await;

        assert!(matches!(result, Err(PipelineError::ReferenceUnavailable { .. })));
    }
}
