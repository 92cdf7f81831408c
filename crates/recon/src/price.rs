//! Golden-record unit price baselining.
//!
//! The golden price of a context key is the mean Price per Unit over every
//! merged record sharing that key. A record deviates when its own unit price
//! differs from the golden price by more than the tolerance, relative to the
//! golden price.

use std::collections::HashMap;

use crate::model::{columns, RecordSet, RowKey, Value};

/// Default relative deviation above which a unit price is flagged.
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// Sales / Quantity when both are numeric and non-zero.
pub fn price_per_unit(sales: Option<f64>, quantity: Option<f64>) -> Option<f64> {
    match (sales, quantity) {
        (Some(s), Some(q)) if s != 0.0 && q != 0.0 => Some(s / q),
        _ => None,
    }
}

/// Write the derived `Price per Unit` column.
pub fn add_price_per_unit(set: &mut RecordSet) {
    let values = (0..set.len())
        .map(|i| {
            price_per_unit(set.number(i, columns::SALES), set.number(i, columns::QUANTITY))
                .map(Value::Float)
                .unwrap_or(Value::Null)
        })
        .collect();
    set.set_column(columns::PRICE_PER_UNIT, values);
}

/// `|price - golden| / golden`, or `None` when there is no usable baseline.
pub fn relative_deviation(price: f64, golden: f64) -> Option<f64> {
    if golden == 0.0 || !golden.is_finite() {
        return None;
    }
    Some((price - golden).abs() / golden)
}

/// Strictly greater than `tolerance`; a deviation equal to it is not an outlier.
pub fn is_outlier(price: f64, golden: f64, tolerance: f64) -> bool {
    relative_deviation(price, golden).is_some_and(|d| d > tolerance)
}

// ---------------------------------------------------------------------------
// Golden table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GoldenTable {
    context_key: Vec<String>,
    prices: HashMap<RowKey, f64>,
}

impl GoldenTable {
    /// Mean non-null Price per Unit per context key over the whole set.
    ///
    /// Keys with a null component are not grouped, and groups without any
    /// price get no entry.
    pub fn build<S: AsRef<str>>(set: &RecordSet, context_key: &[S]) -> Self {
        let key_idx = set.key_indices(context_key);
        let mut sums: HashMap<RowKey, (f64, usize)> = HashMap::new();

        for row in 0..set.len() {
            let key = set.row_key(row, &key_idx);
            if key.iter().any(Option::is_none) {
                continue;
            }
            let entry = sums.entry(key).or_insert((0.0, 0));
            if let Some(price) = set.number(row, columns::PRICE_PER_UNIT) {
                entry.0 += price;
                entry.1 += 1;
            }
        }

        let prices = sums
            .into_iter()
            .filter(|(_, (_, n))| *n > 0)
            .map(|(key, (sum, n))| (key, sum / n as f64))
            .collect();

        Self {
            context_key: context_key.iter().map(|c| c.as_ref().to_string()).collect(),
            prices,
        }
    }

    pub fn context_key(&self) -> &[String] {
        &self.context_key
    }

    pub fn get(&self, key: &RowKey) -> Option<f64> {
        self.prices.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Indices of rows whose unit price deviates from their golden price.
pub fn detect_deviations(set: &RecordSet, table: &GoldenTable, tolerance: f64) -> Vec<usize> {
    let key_idx = set.key_indices(table.context_key());
    (0..set.len())
        .filter(|&row| {
            let Some(golden) = table.get(&set.row_key(row, &key_idx)) else {
                return false;
            };
            match set.number(row, columns::PRICE_PER_UNIT) {
                Some(price) => is_outlier(price, golden, tolerance),
                None => false,
            }
        })
        .collect()
}
