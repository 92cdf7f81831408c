use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::model::{self, RecordSet, RowKey, Value, ValueKind};

#[derive(Debug, Clone, PartialEq)]
pub struct NullFinding {
    pub column: String,
    /// The rows holding a null in `column`.
    pub rows: RecordSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixedTypeFinding {
    pub column: String,
    pub kinds: BTreeSet<ValueKind>,
}

impl MixedTypeFinding {
    pub fn kinds_label(&self) -> String {
        self.kinds.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
    }
}

/// One finding per column that holds at least one null, in column order.
pub fn check_nulls(set: &RecordSet) -> Vec<NullFinding> {
    let mut findings = Vec::new();
    for (idx, column) in set.columns().iter().enumerate() {
        let null_rows: Vec<usize> = set
            .column_values(idx)
            .enumerate()
            .filter(|(_, v)| v.is_null())
            .map(|(i, _)| i)
            .collect();
        if !null_rows.is_empty() {
            findings.push(NullFinding {
                column: column.clone(),
                rows: set.select(&null_rows),
            });
        }
    }
    findings
}

/// Indices of every row whose key occurs more than once. All members are kept,
/// in original order. Nulls compare equal to nulls.
pub fn duplicate_rows<S: AsRef<str>>(set: &RecordSet, key: &[S]) -> Vec<usize> {
    let key_idx = set.key_indices(key);
    let keys: Vec<RowKey> = (0..set.len()).map(|i| set.row_key(i, &key_idx)).collect();

    let mut counts: HashMap<&RowKey, usize> = HashMap::new();
    for k in &keys {
        *counts.entry(k).or_insert(0) += 1;
    }

    keys.iter()
        .enumerate()
        .filter(|(_, k)| counts.get(k).copied().unwrap_or(0) > 1)
        .map(|(i, _)| i)
        .collect()
}

/// Every record participating in a duplicate group on `key`.
pub fn find_duplicates<S: AsRef<str>>(set: &RecordSet, key: &[S]) -> RecordSet {
    set.select(&duplicate_rows(set, key))
}

/// Columns whose non-null cells read as more than one runtime type.
///
/// Text cells are inferred per cell, independent of the declared schema type;
/// integers and floats in one otherwise numeric column count as float.
pub fn check_mixed_types(set: &RecordSet) -> Vec<MixedTypeFinding> {
    set.columns()
        .iter()
        .enumerate()
        .filter_map(|(idx, column)| {
            let kinds: BTreeSet<ValueKind> = model::infer_column(set.column_values(idx))
                .iter()
                .filter_map(Value::kind)
                .collect();
            (kinds.len() > 1).then(|| MixedTypeFinding {
                column: column.clone(),
                kinds,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawTable;

    fn load(headers: &[&str], rows: &[&[&str]]) -> RecordSet {
        RecordSet::from_raw(&RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            skipped_lines: 0,
        })
    }

    #[test]
    fn nulls_reported_with_their_rows() {
        let set = load(&["id", "name", "city"], &[&["1", "", "Oslo"], &["2", "Bo", ""], &["3", "", "Rome"]]);
        let findings = check_nulls(&set);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].column, "name");
        assert_eq!(findings[0].rows.len(), 2);
        assert_eq!(findings[0].rows.value(1, "id"), Some(&Value::Str("3".into())));
        assert_eq!(findings[1].column, "city");
        assert_eq!(findings[1].rows.len(), 1);
    }

    #[test]
    fn duplicates_keep_every_member() {
        let set = load(
            &["order", "product", "note"],
            &[&["A", "P1", "x"], &["B", "P1", "y"], &["A", "P1", "z"], &["A", "P2", "w"]],
        );
        assert_eq!(duplicate_rows(&set, &["order", "product"]), vec![0, 2]);
        let dupes = find_duplicates(&set, &["order", "product"]);
        assert_eq!(dupes.len(), 2);
        assert_eq!(dupes.value(1, "note"), Some(&Value::Str("z".into())));
    }

    #[test]
    fn null_keys_compare_equal() {
        let set = load(&["order", "product"], &[&["A", ""], &["A", ""]]);
        assert_eq!(duplicate_rows(&set, &["order", "product"]), vec![0, 1]);
    }

    #[test]
    fn no_duplicates_is_empty() {
        let set = load(&["order"], &[&["A"], &["B"]]);
        assert!(find_duplicates(&set, &["order"]).is_empty());
    }

    #[test]
    fn mixed_types_ignore_nulls() {
        let set = load(&["zip", "sales", "name"], &[&["10001", "1", "Al"], &["SW1A", "2.5", ""]]);
        let findings = check_mixed_types(&set);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].column, "zip");
        assert_eq!(findings[0].kinds_label(), "int, str");
    }
}
