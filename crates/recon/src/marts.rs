use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::model::{columns::*, RecordSet, RowKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MartKind {
    Customers,
    Products,
    Geography,
    Orders,
    OrderDetails,
}

impl MartKind {
    pub const ALL: [MartKind; 5] = [
        Self::Customers,
        Self::Products,
        Self::Geography,
        Self::Orders,
        Self::OrderDetails,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Products => "products",
            Self::Geography => "geography",
            Self::Orders => "orders",
            Self::OrderDetails => "order_details",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Customers => &[CUSTOMER_ID, CUSTOMER_NAME, SEGMENT],
            Self::Products => &[PRODUCT_ID, CATEGORY, SUB_CATEGORY, PRODUCT_NAME],
            Self::Geography => &[COUNTRY, CITY, STATE, POSTAL_CODE, REGION],
            Self::Orders => &[
                ROW_ID, ORDER_ID, ORDER_DATE, SHIP_DATE, SHIP_MODE, CUSTOMER_ID, COUNTRY, CITY,
                STATE, POSTAL_CODE, REGION,
            ],
            Self::OrderDetails => &[ORDER_ID, PRODUCT_ID, SALES, QUANTITY, DISCOUNT, PROFIT],
        }
    }

    /// Columns duplicates are eliminated on; the first occurrence survives.
    pub fn dedup_key(&self) -> &'static [&'static str] {
        match self {
            Self::Orders => &[ORDER_ID, ORDER_DATE, SHIP_DATE, SHIP_MODE, CUSTOMER_ID],
            other => other.columns(),
        }
    }

    pub fn primary_key(&self) -> &'static [&'static str] {
        match self {
            Self::Customers => &[CUSTOMER_ID],
            Self::Products => &[PRODUCT_ID],
            Self::OrderDetails => &[ORDER_ID],
            Self::Geography | Self::Orders => self.dedup_key(),
        }
    }
}

impl std::fmt::Display for MartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataMart {
    pub kind: MartKind,
    pub records: RecordSet,
}

/// Row/key counts used to sanity-check a mart against its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MartCount {
    pub mart: MartKind,
    pub rows: usize,
    pub distinct_primary_keys: usize,
    /// Only for marts that carry Row ID.
    pub distinct_row_ids: Option<usize>,
}

/// Project and deduplicate one mart.
pub fn build_mart(cleaned: &RecordSet, kind: MartKind) -> DataMart {
    let projected = cleaned.project(kind.columns());
    let key_idx = projected.key_indices(kind.dedup_key());
    let mut seen: HashSet<RowKey> = HashSet::new();
    let records = projected.filter_rows(|i| seen.insert(projected.row_key(i, &key_idx)));
    DataMart { kind, records }
}

/// All five marts, in `MartKind::ALL` order.
pub fn build_marts(cleaned: &RecordSet) -> Vec<DataMart> {
    let marts: Vec<DataMart> = MartKind::ALL.iter().map(|k| build_mart(cleaned, *k)).collect();
    for mart in &marts {
        log::debug!("mart {}: {} rows", mart.kind, mart.records.len());
    }
    marts
}

fn distinct_keys(set: &RecordSet, key: &[&str]) -> usize {
    let key_idx = set.key_indices(key);
    (0..set.len())
        .map(|i| set.row_key(i, &key_idx))
        .collect::<HashSet<_>>()
        .len()
}

pub fn summarize(marts: &[DataMart]) -> Vec<MartCount> {
    marts
        .iter()
        .map(|mart| MartCount {
            mart: mart.kind,
            rows: mart.records.len(),
            distinct_primary_keys: distinct_keys(&mart.records, mart.kind.primary_key()),
            distinct_row_ids: mart
                .records
                .has_column(ROW_ID)
                .then(|| distinct_keys(&mart.records, &[ROW_ID])),
        })
        .collect()
}

/// (Order ID, Product ID) pairs recovered by joining order_details to orders
/// on Order ID and to products on Product ID.
pub fn rejoin_order_lines(marts: &[DataMart]) -> BTreeSet<(String, String)> {
    let find = |kind: MartKind| marts.iter().find(|m| m.kind == kind).map(|m| &m.records);
    let (Some(details), Some(orders), Some(products)) = (
        find(MartKind::OrderDetails),
        find(MartKind::Orders),
        find(MartKind::Products),
    ) else {
        return BTreeSet::new();
    };

    let keys_of = |set: &RecordSet, column: &str| -> HashSet<String> {
        set.column_index(column)
            .map(|idx| set.column_values(idx).filter_map(|v| v.key_text()).collect())
            .unwrap_or_default()
    };
    let order_ids = keys_of(orders, ORDER_ID);
    let product_ids = keys_of(products, PRODUCT_ID);

    let key_idx = details.key_indices(&[ORDER_ID, PRODUCT_ID]);
    (0..details.len())
        .filter_map(|i| match details.row_key(i, &key_idx).as_slice() {
            [Some(order), Some(product)]
                if order_ids.contains(order) && product_ids.contains(product) =>
            {
                Some((order.clone(), product.clone()))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn cleaned() -> RecordSet {
        let cols: Vec<String> = [
            ROW_ID, ORDER_ID, ORDER_DATE, SHIP_DATE, SHIP_MODE, CUSTOMER_ID, CUSTOMER_NAME,
            SEGMENT, COUNTRY, CITY, STATE, POSTAL_CODE, REGION, PRODUCT_ID, CATEGORY,
            SUB_CATEGORY, PRODUCT_NAME, SALES, QUANTITY, DISCOUNT, PROFIT,
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        let row = |row_id: i64, order: &str, product: &str, sales: f64| {
            vec![
                Value::Int(row_id),
                Value::Str(order.into()),
                Value::Str("2024-01-01".into()),
                Value::Str("2024-01-03".into()),
                Value::Str("Standard".into()),
                Value::Str("C1".into()),
                Value::Str("Alice".into()),
                Value::Str("Consumer".into()),
                Value::Str("US".into()),
                Value::Str("Austin".into()),
                Value::Str("TX".into()),
                Value::Str("73301".into()),
                Value::Str("Central".into()),
                Value::Str(product.into()),
                Value::Str("Office".into()),
                Value::Str("Paper".into()),
                Value::Str(format!("{product} name")),
                Value::Float(sales),
                Value::Int(1),
                Value::Float(0.0),
                Value::Float(1.0),
            ]
        };
        RecordSet::from_rows(
            cols,
            vec![
                row(1, "O1", "P1", 10.0),
                row(2, "O1", "P2", 20.0),
                row(3, "O2", "P1", 10.0),
                row(4, "O2", "P1", 10.0),
            ],
        )
    }

    #[test]
    fn marts_deduplicate_on_their_keys() {
        let marts = build_marts(&cleaned());
        let rows: Vec<usize> = marts.iter().map(|m| m.records.len()).collect();
        // customers, products, geography, orders, order_details
        assert_eq!(rows, vec![1, 2, 1, 2, 3]);

        let orders = &marts[3].records;
        assert_eq!(orders.value(0, ROW_ID), Some(&Value::Int(1)));
        assert_eq!(orders.value(1, ROW_ID), Some(&Value::Int(3)));
    }

    #[test]
    fn summary_counts() {
        let counts = summarize(&build_marts(&cleaned()));
        let details = counts.iter().find(|c| c.mart == MartKind::OrderDetails).unwrap();
        assert_eq!(details.rows, 3);
        assert_eq!(details.distinct_primary_keys, 2);
        assert_eq!(details.distinct_row_ids, None);

        let orders = counts.iter().find(|c| c.mart == MartKind::Orders).unwrap();
        assert_eq!(orders.rows, 2);
        assert_eq!(orders.distinct_primary_keys, 2);
        assert_eq!(orders.distinct_row_ids, Some(2));
    }

    #[test]
    fn rejoin_recovers_order_lines() {
        let set = cleaned();
        let pairs = rejoin_order_lines(&build_marts(&set));
        let expected: BTreeSet<(String, String)> = [("O1", "P1"), ("O1", "P2"), ("O2", "P1")]
            .iter()
            .map(|(o, p)| (o.to_string(), p.to_string()))
            .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn empty_input_builds_empty_marts() {
        let marts = build_marts(&RecordSet::default());
        assert_eq!(marts.len(), 5);
        assert!(marts.iter().all(|m| m.records.is_empty()));
        assert_eq!(marts[4].records.columns().len(), 6);
    }
}
