use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{self, columns, RecordSet, Value};

// ---------------------------------------------------------------------------
// Schema definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Integer,
    String,
    Float,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::String => write!(f, "string"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// Ordered column → type mapping. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<(String, ScalarType)>,
}

impl Schema {
    pub fn new(columns: Vec<(String, ScalarType)>) -> Self {
        Self { columns }
    }

    /// The fixed order-record schema.
    pub fn canonical() -> Self {
        use columns::*;
        use ScalarType::*;

        let layout: [(&str, ScalarType); 21] = [
            (ROW_ID, Integer),
            (ORDER_ID, String),
            (ORDER_DATE, String),
            (SHIP_DATE, String),
            (SHIP_MODE, String),
            (CUSTOMER_ID, String),
            (CUSTOMER_NAME, String),
            (SEGMENT, String),
            (COUNTRY, String),
            (CITY, String),
            (STATE, String),
            (POSTAL_CODE, String),
            (REGION, String),
            (PRODUCT_ID, String),
            (CATEGORY, String),
            (SUB_CATEGORY, String),
            (PRODUCT_NAME, String),
            (SALES, Float),
            (QUANTITY, Integer),
            (DISCOUNT, Float),
            (PROFIT, Float),
        ];
        Self::new(layout.iter().map(|(name, ty)| (name.to_string(), *ty)).collect())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, ScalarType)> {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn get(&self, name: &str) -> Option<ScalarType> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, ty)| *ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaFinding {
    MissingColumn { column: String },
    TypeConversion { column: String, expected: ScalarType, cause: String },
    UnexpectedColumn { column: String },
}

impl fmt::Display for SchemaFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { column } => write!(f, "Missing column: {column}"),
            Self::TypeConversion { column, expected, cause } => {
                write!(f, "Error converting column {column} to {expected}: {cause}")
            }
            Self::UnexpectedColumn { column } => write!(f, "Unexpected column: {column}"),
        }
    }
}

/// Explicit shape of a schema check, for callers that branch on it.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOutcome {
    Valid,
    MissingColumns(Vec<String>),
    TypeErrors(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaCheck {
    pub findings: Vec<SchemaFinding>,
}

impl SchemaCheck {
    pub fn missing_columns(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter_map(|f| match f {
                SchemaFinding::MissingColumn { column } => Some(column.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn type_error_columns(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter_map(|f| match f {
                SchemaFinding::TypeConversion { column, .. } => Some(column.clone()),
                _ => None,
            })
            .collect()
    }

    /// Missing columns take precedence over type errors; unexpected columns never fail.
    pub fn outcome(&self) -> SchemaOutcome {
        let missing = self.missing_columns();
        if !missing.is_empty() {
            return SchemaOutcome::MissingColumns(missing);
        }
        let type_errors = self.type_error_columns();
        if !type_errors.is_empty() {
            return SchemaOutcome::TypeErrors(type_errors);
        }
        SchemaOutcome::Valid
    }

    pub fn messages(&self) -> Vec<String> {
        self.findings.iter().map(|f| f.to_string()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validation + coercion
// ---------------------------------------------------------------------------

/// Check `set` against `schema`, coercing every present column in place.
///
/// String columns keep the field text verbatim. A column that fails coercion
/// keeps its per-cell inferred types. Never fails; every problem becomes a finding.
pub fn validate_schema(set: &mut RecordSet, schema: &Schema) -> SchemaCheck {
    let mut check = SchemaCheck::default();

    for (column, expected) in schema.columns() {
        let Some(idx) = set.column_index(column) else {
            check.findings.push(SchemaFinding::MissingColumn { column: column.to_string() });
            continue;
        };

        let coerced = coerce_column(set.column_values(idx), expected);
        match coerced {
            Ok(values) => set.replace_column(idx, values),
            Err(cause) => {
                let inferred = model::infer_column(set.column_values(idx));
                set.replace_column(idx, inferred);
                check.findings.push(SchemaFinding::TypeConversion {
                    column: column.to_string(),
                    expected,
                    cause,
                });
            }
        }
    }

    for column in set.columns() {
        if !schema.contains(column) && column != columns::SOURCE_FILE {
            check.findings.push(SchemaFinding::UnexpectedColumn { column: column.clone() });
        }
    }

    check
}

/// All-or-nothing: the first failing cell aborts the column.
fn coerce_column<'a>(
    values: impl Iterator<Item = &'a Value>,
    target: ScalarType,
) -> Result<Vec<Value>, String> {
    values
        .enumerate()
        .map(|(row, v)| coerce_value(v, target).map_err(|e| format!("row {}: {e}", row + 1)))
        .collect()
}

fn coerce_value(value: &Value, target: ScalarType) -> Result<Value, String> {
    match target {
        ScalarType::String => Ok(match value {
            Value::Null => Value::Null,
            Value::Str(s) => Value::Str(s.clone()),
            other => Value::Str(other.to_string()),
        }),
        ScalarType::Float => match value {
            Value::Null => Ok(Value::Null),
            Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Float(f) => Ok(Value::Float(*f)),
            Value::Str(s) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                _ => Err(format!("could not convert string to float: '{s}'")),
            },
        },
        ScalarType::Integer => match value {
            Value::Null => Err("cannot convert null to integer".into()),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(Value::Int(*f as i64)),
            Value::Float(f) => Err(format!("cannot convert {f} to integer without loss")),
            Value::Str(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(Value::Int(f as i64)),
                    _ => Err(format!("invalid literal for integer: '{s}'")),
                }
            }
        },
    }
}
