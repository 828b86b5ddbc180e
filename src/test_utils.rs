// Test utilities available to both unit and integration tests
// Only compiled when testing

use crate::rules::RuleSpec;
use crate::sheet::{RawRow, SheetData};

/// Build in-memory sheet data from string literals
///
/// Rows are numbered the way the file reader numbers them: the header is
/// row 1, so the first data row is row 2.
#[allow(dead_code)]
pub fn sheet(headers: &[&str], rows: &[&[&str]]) -> SheetData {
    SheetData {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                RawRow::new(i + 2, cells.iter().map(|c| c.to_string()).collect())
            })
            .collect(),
    }
}

/// Spec with a single column bound to a pipe-separated rule list
#[allow(dead_code)]
pub fn single_rule_spec(key: &str, rules: &str) -> RuleSpec {
    RuleSpec::new().field(key, rules)
}
