// 🔤 Name Normalizer - Canonical player names for joining
// Wallet display names and the TP reference table are typed by different
// people, so both sides go through the same canonical form before lookup.

/// Known misspellings rewritten before comparison: (wrong, right)
const SPELLING_FIXES: &[(&str, &str)] = &[("christiian", "christian")];

/// Normalize a free-text player name for equality comparison
///
/// - Trim + ASCII lowercase
/// - Fix known misspellings ("Christiian" → "christian")
/// - Drop everything except a-z, 0-9 and whitespace
/// - Collapse whitespace runs to a single space
///
/// Example: "  Chriss O'Brien!! " → "chriss obrien"
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let corrected = fix_spellings(lowered);

    let cleaned: String = corrected
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    // Stripping punctuation can glue a misspelling back together ("christi-ian")
    fix_spellings(collapsed)
}

fn fix_spellings(mut name: String) -> String {
    for (wrong, right) in SPELLING_FIXES {
        while name.contains(wrong) {
            name = name.replace(wrong, right);
        }
    }
    name
}

// ============================================================================
// TESTS
// ============================================================================
