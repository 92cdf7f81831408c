use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::model::{columns, RecordSet, Value};

/// A key column that is expected to determine exactly one attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRelation {
    pub key: &'static str,
    pub attribute: &'static str,
}

pub const CUSTOMER_NAME: IdentityRelation = IdentityRelation {
    key: columns::CUSTOMER_ID,
    attribute: columns::CUSTOMER_NAME,
};

pub const PRODUCT_NAME: IdentityRelation = IdentityRelation {
    key: columns::PRODUCT_ID,
    attribute: columns::PRODUCT_NAME,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityViolation {
    pub key: String,
    /// Distinct attribute values seen for `key`, sorted.
    pub values: Vec<String>,
}

impl IdentityViolation {
    pub fn distinct_count(&self) -> usize {
        self.values.len()
    }
}

/// Keys mapping to more than one distinct non-null attribute value, sorted by key.
///
/// Null keys are not grouped. An empty result means the relation is a function
/// over the observed data.
pub fn check_identity(set: &RecordSet, relation: IdentityRelation) -> Vec<IdentityViolation> {
    let (Some(key_idx), Some(attr_idx)) = (
        set.column_index(relation.key),
        set.column_index(relation.attribute),
    ) else {
        return Vec::new();
    };

    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in set.rows() {
        let Some(key) = row[key_idx].key_text() else {
            continue;
        };
        let entry = groups.entry(key).or_default();
        if let Some(value) = row[attr_idx].key_text() {
            entry.insert(value);
        }
    }

    groups
        .into_iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(key, values)| IdentityViolation {
            key,
            values: values.into_iter().collect(),
        })
        .collect()
}

/// Full records belonging to any violating key, in original order.
pub fn offending_records(
    set: &RecordSet,
    relation: IdentityRelation,
    violations: &[IdentityViolation],
) -> RecordSet {
    let keys: HashSet<&str> = violations.iter().map(|v| v.key.as_str()).collect();
    let Some(key_idx) = set.column_index(relation.key) else {
        return RecordSet::new(set.columns().to_vec());
    };
    set.filter_rows(|i| {
        set.rows()[i][key_idx]
            .key_text()
            .is_some_and(|k| keys.contains(k.as_str()))
    })
}

/// Two-column table (key, distinct attribute count) for example export.
pub fn violation_table(relation: IdentityRelation, violations: &[IdentityViolation]) -> RecordSet {
    RecordSet::from_rows(
        vec![relation.key.to_string(), format!("Distinct {}s", relation.attribute)],
        violations
            .iter()
            .map(|v| vec![Value::Str(v.key.clone()), Value::Int(v.distinct_count() as i64)])
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customers(rows: &[(&str, &str)]) -> RecordSet {
        RecordSet::from_rows(
            vec!["Customer ID".into(), "Customer Name".into()],
            rows.iter()
                .map(|(id, name)| vec![Value::infer(id), Value::infer(name)])
                .collect(),
        )
    }

    #[test]
    fn flags_key_with_two_names() {
        let set = customers(&[("C1", "Alice"), ("C2", "Bob"), ("C1", "Alicia"), ("C1", "Alice")]);
        let violations = check_identity(&set, CUSTOMER_NAME);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].key, "C1");
        assert_eq!(violations[0].distinct_count(), 2);
        assert_eq!(violations[0].values, vec!["Alice", "Alicia"]);
    }

    #[test]
    fn null_names_are_not_distinct_values() {
        let set = customers(&[("C1", "Alice"), ("C1", ""), ("", "Zed"), ("", "Ann")]);
        assert!(check_identity(&set, CUSTOMER_NAME).is_empty());
    }

    #[test]
    fn offending_records_keep_all_rows_of_flagged_keys() {
        let set = customers(&[("C1", "Alice"), ("C2", "Bob"), ("C1", "Alicia")]);
        let violations = check_identity(&set, CUSTOMER_NAME);
        let rows = offending_records(&set, CUSTOMER_NAME, &violations);
        assert_eq!(rows.len(), 2);

        let table = violation_table(CUSTOMER_NAME, &violations);
        assert_eq!(table.columns(), &["Customer ID", "Distinct Customer Names"]);
        assert_eq!(table.value(0, "Distinct Customer Names"), Some(&Value::Int(2)));
    }

    #[test]
    fn missing_columns_yield_nothing() {
        let set = customers(&[("C1", "Alice")]);
        assert!(check_identity(&set, PRODUCT_NAME).is_empty());
    }
}
