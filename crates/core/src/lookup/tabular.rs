//! First-column extraction from raw tabular report output
//!
//! The raw export endpoint returns CSV-like text: a header row followed by
//! one row per segment. Only the leading field of each data row is
//! meaningful here; the rest of the row is report decoration.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading field of a row: optionally double-quoted, terminated by a comma
/// or end of line. Surrounding whitespace is insignificant.
static LEADING_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:"([^"]*)"|([^,]*?))\s*(?:,|$)"#)
        .expect("leading-field regex should compile - this is a bug")
});

/// Extract the first-column values from a raw tabular payload.
///
/// The first row is a header and is skipped. Rows whose leading field is
/// blank are discarded. Row order is preserved and duplicates are kept.
/// Header-only or empty input yields an empty list.
#[must_use]
pub fn parse_segment_ids(raw: &str) -> Vec<String> {
    raw.lines()
        .skip(1)
        .filter_map(|row| {
            let captures = LEADING_FIELD.captures(row)?;
            let field = captures.get(1).or_else(|| captures.get(2))?.as_str().trim();
            if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            }
        })
        .collect()
}
