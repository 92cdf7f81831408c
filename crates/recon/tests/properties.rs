// Property-based tests for partitioning, price baselining and mart rebuilding.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;

use orderqa_recon::marts;
use orderqa_recon::model::columns;
use orderqa_recon::price::{self, GoldenTable};
use orderqa_recon::reconcile::{self, VariantClass};
use orderqa_recon::{RecordSet, Schema, Value};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Line {
    order: u8,
    product: u8,
    customer: u8,
    sales: f64,
    quantity: i64,
}

/// Small key spaces so groups and shared contexts actually occur.
fn arb_line() -> impl Strategy<Value = Line> {
    (
        0u8..5,
        0u8..4,
        0u8..3,
        prop_oneof![
            2 => Just(0.0),
            1 => Just(5.0),
            1 => Just(10.0),
            1 => 1.0..500.0f64,
        ],
        0i64..4,
    )
        .prop_map(|(order, product, customer, sales, quantity)| Line {
            order,
            product,
            customer,
            sales,
            quantity,
        })
}

fn arb_lines() -> impl Strategy<Value = Vec<Line>> {
    proptest::collection::vec(arb_line(), 0..40)
}

/// Full canonical records, with the derived price column already added.
fn records(lines: &[Line]) -> RecordSet {
    let cols: Vec<String> = Schema::canonical().columns().map(|(c, _)| c.to_string()).collect();
    let rows = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            cols.iter()
                .map(|c| match c.as_str() {
                    columns::ROW_ID => Value::Int(i as i64 + 1),
                    columns::ORDER_ID => Value::Str(format!("O{}", l.order)),
                    columns::PRODUCT_ID => Value::Str(format!("P{}", l.product)),
                    columns::PRODUCT_NAME => Value::Str(format!("Product {}", l.product)),
                    columns::CUSTOMER_ID => Value::Str(format!("C{}", l.customer)),
                    columns::CUSTOMER_NAME => Value::Str(format!("Customer {}", l.customer)),
                    columns::SALES => Value::Float(l.sales),
                    columns::QUANTITY => Value::Int(l.quantity),
                    columns::DISCOUNT | columns::PROFIT => Value::Float(0.0),
                    other => Value::Str(format!("{other} value")),
                })
                .collect()
        })
        .collect();
    let mut set = RecordSet::from_rows(cols, rows);
    price::add_price_per_unit(&mut set);
    set
}

fn row_ids(set: &RecordSet) -> BTreeSet<i64> {
    (0..set.len())
        .filter_map(|i| match set.value(i, columns::ROW_ID) {
            Some(Value::Int(id)) => Some(*id),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn cleaned_is_exactly_the_non_placeholder_rows(lines in arb_lines()) {
        let set = records(&lines);
        let groups = reconcile::classify_order_lines(&set);
        let flags = reconcile::review_flags(set.len(), &groups);
        let parts = reconcile::partition(&set, &flags);

        let expected: BTreeSet<i64> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| !(l.sales == 0.0 && l.quantity == 0))
            .map(|(i, _)| i as i64 + 1)
            .collect();
        prop_assert_eq!(row_ids(&parts.cleaned), expected);
        for i in 0..parts.cleaned.len() {
            prop_assert!(!reconcile::is_placeholder(&parts.cleaned, i));
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn review_holds_only_needs_review_group_members(lines in arb_lines()) {
        let set = records(&lines);
        let groups = reconcile::classify_order_lines(&set);
        let flags = reconcile::review_flags(set.len(), &groups);
        let parts = reconcile::partition(&set, &flags);

        let mut expected = BTreeSet::new();
        for group in &groups {
            prop_assert!(group.rows.len() > 1);
            let ids = group.rows.iter().map(|&r| r as i64 + 1);
            match group.class {
                VariantClass::NeedsReview => expected.extend(ids),
                VariantClass::Benign => {
                    for &r in &group.rows {
                        prop_assert!(!flags[r], "benign member {} flagged", r);
                    }
                }
            }
        }
        prop_assert_eq!(row_ids(&parts.review), expected);
    }
}

// ---------------------------------------------------------------------------
// Price baselining
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn raising_tolerance_never_flags_more(
        lines in arb_lines(),
        t1 in 0.0..1.0f64,
        gap in 0.001..1.0f64,
    ) {
        let set = records(&lines);
        let context = [columns::PRODUCT_ID, columns::CUSTOMER_ID];
        let table = GoldenTable::build(&set, &context);

        let loose: HashSet<usize> = price::detect_deviations(&set, &table, t1 + gap).into_iter().collect();
        let tight: HashSet<usize> = price::detect_deviations(&set, &table, t1).into_iter().collect();
        prop_assert!(loose.is_subset(&tight));
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn rows_without_a_price_are_never_flagged(lines in arb_lines()) {
        let set = records(&lines);
        let table = GoldenTable::build(&set, &[columns::PRODUCT_ID]);
        for row in price::detect_deviations(&set, &table, 0.0) {
            prop_assert!(lines[row].sales != 0.0 && lines[row].quantity != 0);
        }
    }
}

// ---------------------------------------------------------------------------
// Marts
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn marts_rejoin_to_the_cleaned_order_lines(lines in arb_lines()) {
        let set = records(&lines);
        let groups = reconcile::classify_order_lines(&set);
        let flags = reconcile::review_flags(set.len(), &groups);
        let cleaned = reconcile::partition(&set, &flags).cleaned;

        let expected: BTreeSet<(String, String)> = lines
            .iter()
            .filter(|l| !(l.sales == 0.0 && l.quantity == 0))
            .map(|l| (format!("O{}", l.order), format!("P{}", l.product)))
            .collect();
        prop_assert_eq!(marts::rejoin_order_lines(&marts::build_marts(&cleaned)), expected);
    }
}
