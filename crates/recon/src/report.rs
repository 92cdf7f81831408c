use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::model::{columns, RecordSet};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IssueCategory {
    #[serde(rename = "File Extension Issues")]
    FileExtension,
    #[serde(rename = "File Name Issues")]
    FileName,
    #[serde(rename = "File Load Issues")]
    FileLoad,
    #[serde(rename = "Schema Validation Issues")]
    SchemaValidation,
    #[serde(rename = "Missing Columns")]
    MissingColumns,
    #[serde(rename = "Null Value Issues")]
    NullValue,
    #[serde(rename = "Duplicate Issues")]
    Duplicate,
    #[serde(rename = "Cross File Duplicate Issues")]
    CrossFileDuplicate,
    #[serde(rename = "Inconsistent Associations Issues")]
    InconsistentAssociations,
    /// Examples only; findings go to `InconsistentAssociations`.
    #[serde(rename = "Inconsistent Customer ID Issues")]
    InconsistentCustomerId,
    /// Examples only; findings go to `InconsistentAssociations`.
    #[serde(rename = "Inconsistent Product ID Issues")]
    InconsistentProductId,
    #[serde(rename = "Mixed Data Type Issues")]
    MixedDataType,
    #[serde(rename = "Price Inconsistencies")]
    PriceInconsistency,
    #[serde(rename = "Sales Profit Inconsistencies")]
    SalesProfitInconsistency,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 14] = [
        Self::FileExtension,
        Self::FileName,
        Self::FileLoad,
        Self::SchemaValidation,
        Self::MissingColumns,
        Self::NullValue,
        Self::Duplicate,
        Self::CrossFileDuplicate,
        Self::InconsistentAssociations,
        Self::InconsistentCustomerId,
        Self::InconsistentProductId,
        Self::MixedDataType,
        Self::PriceInconsistency,
        Self::SalesProfitInconsistency,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::FileExtension => "File Extension Issues",
            Self::FileName => "File Name Issues",
            Self::FileLoad => "File Load Issues",
            Self::SchemaValidation => "Schema Validation Issues",
            Self::MissingColumns => "Missing Columns",
            Self::NullValue => "Null Value Issues",
            Self::Duplicate => "Duplicate Issues",
            Self::CrossFileDuplicate => "Cross File Duplicate Issues",
            Self::InconsistentAssociations => "Inconsistent Associations Issues",
            Self::InconsistentCustomerId => "Inconsistent Customer ID Issues",
            Self::InconsistentProductId => "Inconsistent Product ID Issues",
            Self::MixedDataType => "Mixed Data Type Issues",
            Self::PriceInconsistency => "Price Inconsistencies",
            Self::SalesProfitInconsistency => "Sales Profit Inconsistencies",
        }
    }

    /// Categories whose examples back this category's summary counts.
    pub fn example_sources(&self) -> &'static [IssueCategory] {
        match self {
            Self::InconsistentAssociations => {
                &[Self::InconsistentCustomerId, Self::InconsistentProductId]
            }
            Self::FileExtension => &[Self::FileExtension],
            Self::FileName => &[Self::FileName],
            Self::FileLoad => &[Self::FileLoad],
            Self::SchemaValidation => &[Self::SchemaValidation],
            Self::MissingColumns => &[Self::MissingColumns],
            Self::NullValue => &[Self::NullValue],
            Self::Duplicate => &[Self::Duplicate],
            Self::CrossFileDuplicate => &[Self::CrossFileDuplicate],
            Self::InconsistentCustomerId => &[Self::InconsistentCustomerId],
            Self::InconsistentProductId => &[Self::InconsistentProductId],
            Self::MixedDataType => &[Self::MixedDataType],
            Self::PriceInconsistency => &[Self::PriceInconsistency],
            Self::SalesProfitInconsistency => &[Self::SalesProfitInconsistency],
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// Source identifier used for dataset-wide findings.
pub const MULTIPLE_FILES: &str = "Multiple files";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub source: String,
    pub description: String,
    pub affected_rows: usize,
    pub remediation: String,
}

impl Finding {
    pub fn new(
        source: impl Into<String>,
        description: impl Into<String>,
        affected_rows: usize,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            description: description.into(),
            affected_rows,
            remediation: remediation.into(),
        }
    }
}

/// Category → ordered findings. Every category is present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueReport {
    entries: BTreeMap<IssueCategory, Vec<Finding>>,
}

impl Default for IssueReport {
    fn default() -> Self {
        Self {
            entries: IssueCategory::ALL.iter().map(|c| (*c, Vec::new())).collect(),
        }
    }
}

impl IssueReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: IssueCategory, finding: Finding) {
        self.entries.entry(category).or_default().push(finding);
    }

    pub fn findings(&self, category: IssueCategory) -> &[Finding] {
        self.entries.get(&category).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (IssueCategory, &[Finding])> {
        self.entries.iter().map(|(c, f)| (*c, f.as_slice()))
    }

    pub fn total_findings(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_findings() == 0
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.entries
            .iter()
            .map(|(c, f)| (c.label().to_string(), f.len()))
            .collect()
    }

    /// Flat issue log: one row per finding, in category order.
    pub fn quality_rows(&self) -> Vec<QualityRow> {
        self.iter()
            .flat_map(|(category, findings)| {
                findings.iter().map(move |f| QualityRow {
                    category,
                    source: f.source.clone(),
                    description: f.description.clone(),
                    affected_rows: f.affected_rows,
                    remediation: f.remediation.clone(),
                })
            })
            .collect()
    }

    /// One row per finding with the distinct Row ID count of its category's examples.
    pub fn summary_rows(&self, examples: &IssueExamples) -> Vec<SummaryRow> {
        let mut rows = Vec::new();
        for (category, findings) in self.iter() {
            let distinct = examples.distinct_row_ids(category.example_sources());
            for f in findings {
                rows.push(SummaryRow {
                    category,
                    description: f.description.clone(),
                    remediation: f.remediation.clone(),
                    distinct_row_ids: distinct,
                });
            }
        }
        rows
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRow {
    pub category: IssueCategory,
    pub source: String,
    pub description: String,
    pub affected_rows: usize,
    pub remediation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub category: IssueCategory,
    pub description: String,
    pub remediation: String,
    pub distinct_row_ids: usize,
}

// ---------------------------------------------------------------------------
// Examples
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Example {
    Records(RecordSet),
    Note { source: String, detail: String },
}

/// Category → the offending record subsets (or notes) behind its findings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueExamples {
    entries: BTreeMap<IssueCategory, Vec<Example>>,
}

impl IssueExamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_records(&mut self, category: IssueCategory, records: RecordSet) {
        self.entries.entry(category).or_default().push(Example::Records(records));
    }

    pub fn push_note(&mut self, category: IssueCategory, source: impl Into<String>, detail: impl Into<String>) {
        self.entries.entry(category).or_default().push(Example::Note {
            source: source.into(),
            detail: detail.into(),
        });
    }

    pub fn get(&self, category: IssueCategory) -> &[Example] {
        self.entries.get(&category).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (IssueCategory, &[Example])> {
        self.entries.iter().map(|(c, e)| (*c, e.as_slice()))
    }

    /// Distinct Row ID values across the record examples of `categories`.
    pub fn distinct_row_ids(&self, categories: &[IssueCategory]) -> usize {
        let mut ids: HashSet<String> = HashSet::new();
        for category in categories {
            for example in self.get(*category) {
                let Example::Records(set) = example else { continue };
                let Some(idx) = set.column_index(columns::ROW_ID) else { continue };
                ids.extend(set.column_values(idx).filter_map(|v| v.key_text()));
            }
        }
        ids.len()
    }
}
