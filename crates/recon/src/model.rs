use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Canonical order-record column names plus the derived columns this engine adds.
pub mod columns {
    pub const ROW_ID: &str = "Row ID";
    pub const ORDER_ID: &str = "Order ID";
    pub const ORDER_DATE: &str = "Order Date";
    pub const SHIP_DATE: &str = "Ship Date";
    pub const SHIP_MODE: &str = "Ship Mode";
    pub const CUSTOMER_ID: &str = "Customer ID";
    pub const CUSTOMER_NAME: &str = "Customer Name";
    pub const SEGMENT: &str = "Segment";
    pub const COUNTRY: &str = "Country";
    pub const CITY: &str = "City";
    pub const STATE: &str = "State";
    pub const POSTAL_CODE: &str = "Postal Code";
    pub const REGION: &str = "Region";
    pub const PRODUCT_ID: &str = "Product ID";
    pub const CATEGORY: &str = "Category";
    pub const SUB_CATEGORY: &str = "Sub-Category";
    pub const PRODUCT_NAME: &str = "Product Name";
    pub const SALES: &str = "Sales";
    pub const QUANTITY: &str = "Quantity";
    pub const DISCOUNT: &str = "Discount";
    pub const PROFIT: &str = "Profit";

    /// Provenance tag added to every loaded record.
    pub const SOURCE_FILE: &str = "Source File";
    pub const PRICE_PER_UNIT: &str = "Price per Unit";
    pub const NEEDS_REVIEW: &str = "Needs Review";
    pub const DUPLICATE: &str = "Duplicate";
}

/// Text the loader treats as a missing value.
const NA_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "None", "#N/A"];

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single cell with the runtime type it was loaded or coerced as.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Runtime type of a non-null value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "str"),
        }
    }
}

impl Value {
    /// Infer a value from raw field text: NA markers, then integer, then float, then text.
    pub fn infer(raw: &str) -> Value {
        let trimmed = raw.trim();
        if NA_MARKERS.contains(&trimmed) {
            return Value::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => Value::Str(raw.to_string()),
        }
    }

    /// A loaded cell: NA markers become null, anything else stays as the exact field text.
    pub fn text(raw: &str) -> Value {
        if NA_MARKERS.contains(&raw.trim()) {
            Value::Null
        } else {
            Value::Str(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Str(_) => Some(ValueKind::Str),
        }
    }

    /// Numeric view. Text is never parsed here; uncoerced columns stay non-numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Comparison form used for grouping and duplicate keys. `None` for nulls.
    ///
    /// Integral floats normalize to their integer text so `10` and `10.0` group together.
    pub fn key_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some((*f as i64).to_string())
                } else {
                    Some(f.to_string())
                }
            }
            Value::Str(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Per-cell runtime types of one column as its text reads.
///
/// A column whose non-null cells are all numeric becomes float when any cell is
/// float. Cells that are already typed pass through unchanged.
pub fn infer_column<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut inferred: Vec<Value> = values
        .map(|v| match v {
            Value::Str(s) => Value::infer(s),
            other => other.clone(),
        })
        .collect();

    let all_numeric = inferred
        .iter()
        .all(|v| matches!(v, Value::Null | Value::Int(_) | Value::Float(_)));
    let has_float = inferred.iter().any(|v| matches!(v, Value::Float(_)));
    if all_numeric && has_float {
        for v in &mut inferred {
            if let Value::Int(i) = *v {
                *v = Value::Float(i as f64);
            }
        }
    }
    inferred
}

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// Header plus string rows as produced by a loader, before type inference.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Malformed lines the loader dropped.
    pub skipped_lines: usize,
}

// ---------------------------------------------------------------------------
// Record sets
// ---------------------------------------------------------------------------

/// Grouping key: one entry per key column, `None` where the cell is null or the column absent.
pub type RowKey = Vec<Option<String>>;

/// Ordered columns and rows of values aligned to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut set = Self::new(columns);
        for row in rows {
            set.push_row(row);
        }
        set
    }

    /// Build a record set from loader output. Cells keep their field text verbatim;
    /// typing is left to schema coercion.
    pub fn from_raw(table: &RawTable) -> Self {
        let rows = table
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| Value::text(cell)).collect())
            .collect();
        Self::from_rows(table.headers.clone(), rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell lookup by column name. `None` when the column does not exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Numeric cell lookup; `None` for absent columns, nulls and non-numeric cells.
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.value(row, column).and_then(Value::as_f64)
    }

    /// All cells of one column, top to bottom.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |r| &r[idx])
    }

    pub(crate) fn replace_column(&mut self, idx: usize, values: Vec<Value>) {
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }

    /// Add a derived column, or overwrite it when it already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
                self.columns.len() - 1
            }
        };
        self.replace_column(idx, values);
    }

    /// Append a row, padding with nulls or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Rows at the given indices, in the given order.
    pub fn select(&self, indices: &[usize]) -> RecordSet {
        RecordSet {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> RecordSet {
        let indices: Vec<usize> = (0..self.rows.len()).filter(|&i| keep(i)).collect();
        self.select(&indices)
    }

    /// Project onto a column subset; columns missing here come back all-null.
    pub fn project(&self, columns: &[&str]) -> RecordSet {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        RecordSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    indices
                        .iter()
                        .map(|idx| idx.map(|i| row[i].clone()).unwrap_or(Value::Null))
                        .collect()
                })
                .collect(),
        }
    }

    /// Append another set, taking the union of columns in first-seen order.
    pub fn append(&mut self, other: &RecordSet) {
        for col in &other.columns {
            if !self.has_column(col) {
                self.columns.push(col.clone());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
            }
        }
        let mapping: Vec<Option<usize>> =
            self.columns.iter().map(|c| other.column_index(c)).collect();
        for row in &other.rows {
            self.rows.push(
                mapping
                    .iter()
                    .map(|idx| idx.map(|i| row[i].clone()).unwrap_or(Value::Null))
                    .collect(),
            );
        }
    }

    /// Resolve key column names to indices; absent columns stay `None`.
    pub fn key_indices<S: AsRef<str>>(&self, columns: &[S]) -> Vec<Option<usize>> {
        columns.iter().map(|c| self.column_index(c.as_ref())).collect()
    }

    pub fn row_key(&self, row: usize, key_indices: &[Option<usize>]) -> RowKey {
        key_indices
            .iter()
            .map(|idx| idx.and_then(|i| self.rows[row][i].key_text()))
            .collect()
    }
}
