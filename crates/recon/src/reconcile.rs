use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{columns, RecordSet, Value};
use crate::quality::duplicate_rows;

// ---------------------------------------------------------------------------
// Cross-file duplicates + sales/profit
// ---------------------------------------------------------------------------

/// Dataset-wide duplicate members tagged `Duplicate = true`, stably sorted by Order ID.
pub fn cross_file_duplicates<S: AsRef<str>>(set: &RecordSet, key: &[S]) -> RecordSet {
    let mut rows = duplicate_rows(set, key);
    let order_idx = set.column_index(columns::ORDER_ID);
    // Nulls sort last
    rows.sort_by_key(|&i| {
        let order = order_idx.and_then(|idx| set.rows()[i][idx].key_text());
        (order.is_none(), order)
    });

    let mut dupes = set.select(&rows);
    let len = dupes.len();
    dupes.set_column(columns::DUPLICATE, vec![Value::Bool(true); len]);
    dupes
}

/// Rows with zero Sales but non-zero Profit.
pub fn sales_profit_anomalies(set: &RecordSet) -> Vec<usize> {
    (0..set.len())
        .filter(|&i| {
            matches!(
                (set.number(i, columns::SALES), set.number(i, columns::PROFIT)),
                (Some(s), Some(p)) if s == 0.0 && p != 0.0
            )
        })
        .collect()
}

/// Zero Sales and zero Quantity: a non-informative placeholder row.
pub fn is_placeholder(set: &RecordSet, row: usize) -> bool {
    set.number(row, columns::SALES) == Some(0.0) && set.number(row, columns::QUANTITY) == Some(0.0)
}

// ---------------------------------------------------------------------------
// Order-line variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantClass {
    /// Has both a zero-Sales and a positive-Sales member: a correction pattern.
    Benign,
    NeedsReview,
}

/// Rows sharing one (Order ID, Product ID) pair, two or more of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLineGroup {
    pub order_id: String,
    pub product_id: String,
    pub rows: Vec<usize>,
    pub class: VariantClass,
}

/// Group duplicate (Order ID, Product ID) pairs and classify each group once.
///
/// Rows with a null Order ID or Product ID are not grouped. Groups come back
/// sorted by (Order ID, Product ID).
pub fn classify_order_lines(set: &RecordSet) -> Vec<OrderLineGroup> {
    let key_idx = set.key_indices(&[columns::ORDER_ID, columns::PRODUCT_ID]);
    let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();

    for row in 0..set.len() {
        if let [Some(order), Some(product)] = set.row_key(row, &key_idx).as_slice() {
            groups
                .entry((order.clone(), product.clone()))
                .or_default()
                .push(row);
        }
    }

    groups
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .map(|((order_id, product_id), rows)| {
            let sales: Vec<Option<f64>> = rows.iter().map(|&i| set.number(i, columns::SALES)).collect();
            let has_zero = sales.iter().any(|s| *s == Some(0.0));
            let has_positive = sales.iter().any(|s| s.is_some_and(|v| v > 0.0));
            let class = if has_zero && has_positive {
                VariantClass::Benign
            } else {
                VariantClass::NeedsReview
            };
            OrderLineGroup { order_id, product_id, rows, class }
        })
        .collect()
}

/// Per-row review flag: true for every member of a `NeedsReview` group.
pub fn review_flags(len: usize, groups: &[OrderLineGroup]) -> Vec<bool> {
    let mut flags = vec![false; len];
    for group in groups.iter().filter(|g| g.class == VariantClass::NeedsReview) {
        for &row in &group.rows {
            flags[row] = true;
        }
    }
    flags
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Everything except placeholder rows.
    pub cleaned: RecordSet,
    /// Exactly the rows flagged for external review.
    pub review: RecordSet,
}

/// Split into cleaned and review sets. The two filters are independent, so a
/// row can land in both or neither.
pub fn partition(set: &RecordSet, flags: &[bool]) -> Partition {
    Partition {
        cleaned: set.filter_rows(|i| !is_placeholder(set, i)),
        review: set.filter_rows(|i| flags.get(i).copied().unwrap_or(false)),
    }
}
