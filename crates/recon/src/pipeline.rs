use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::ReconError;
use crate::identity::{self, IdentityRelation, IdentityViolation, CUSTOMER_NAME, PRODUCT_NAME};
use crate::model::{columns, RawTable, RecordSet, Value};
use crate::naming::{self, NameTaxonomy};
use crate::price::{self, GoldenTable};
use crate::quality::{self, MixedTypeFinding};
use crate::reconcile::{self, OrderLineGroup, VariantClass};
use crate::report::{Finding, IssueCategory, IssueExamples, IssueReport, QualityRow, MULTIPLE_FILES};
use crate::schema::{self, Schema};

// ---------------------------------------------------------------------------
// Loader seam
// ---------------------------------------------------------------------------

/// Reads one input file into a raw table. Implemented by the IO layer.
pub trait SourceLoader {
    fn load(&self, file: &str) -> Result<RawTable, ReconError>;
}

// ---------------------------------------------------------------------------
// File states
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Pending,
    NameChecked,
    Loaded,
    SchemaChecked,
    Merged,
    /// Not a `.csv` file.
    ExtensionRejected,
    /// File name does not match the taxonomy.
    Rejected,
    /// The loader could not read the file.
    Unreadable,
    /// Required schema columns are missing.
    ColumnRejected,
}

impl FileState {
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Self::ExtensionRejected | Self::Rejected | Self::Unreadable | Self::ColumnRejected
        )
    }
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::NameChecked => write!(f, "name-checked"),
            Self::Loaded => write!(f, "loaded"),
            Self::SchemaChecked => write!(f, "schema-checked"),
            Self::Merged => write!(f, "merged"),
            Self::ExtensionRejected => write!(f, "extension-rejected"),
            Self::Rejected => write!(f, "rejected"),
            Self::Unreadable => write!(f, "unreadable"),
            Self::ColumnRejected => write!(f, "column-rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub file: String,
    pub state: FileState,
    pub rows_loaded: usize,
    pub lines_skipped: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub price_tolerance: f64,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub meta: RunMeta,
    pub report: IssueReport,
    pub examples: IssueExamples,
    pub files: Vec<FileOutcome>,
    /// Every merged record, with the derived columns added.
    pub merged: RecordSet,
    pub cleaned: RecordSet,
    pub review: RecordSet,
    pub golden_keys: usize,
    pub order_line_groups: Vec<OrderLineGroup>,
}

/// Serializable overview of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub meta: RunMeta,
    pub files: Vec<FileOutcome>,
    pub merged_rows: usize,
    pub cleaned_rows: usize,
    pub review_rows: usize,
    pub golden_keys: usize,
    pub benign_groups: usize,
    pub review_groups: usize,
    pub findings: BTreeMap<String, usize>,
    pub issues: Vec<QualityRow>,
}

impl PipelineOutput {
    pub fn summary(&self) -> RunSummary {
        let benign = self
            .order_line_groups
            .iter()
            .filter(|g| g.class == VariantClass::Benign)
            .count();
        RunSummary {
            meta: self.meta.clone(),
            files: self.files.clone(),
            merged_rows: self.merged.len(),
            cleaned_rows: self.cleaned.len(),
            review_rows: self.review.len(),
            golden_keys: self.golden_keys,
            benign_groups: benign,
            review_groups: self.order_line_groups.len() - benign,
            findings: self.report.counts(),
            issues: self.report.quality_rows(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Findings accumulated across the whole run.
#[derive(Default)]
struct Collector {
    report: IssueReport,
    examples: IssueExamples,
    /// (relation key column, key) pairs already flagged inside a single file.
    flagged_identities: HashSet<(&'static str, String)>,
}

impl Collector {
    fn reject(&mut self, category: IssueCategory, file: &str, message: String, remediation: &str) {
        self.report.push(category, Finding::new(file, message.clone(), 0, remediation));
        self.examples.push_note(category, file, message);
    }
}

struct FileContext<'a> {
    config: &'a PipelineConfig,
    schema: &'a Schema,
    taxonomy: &'a NameTaxonomy,
    loader: &'a dyn SourceLoader,
}

struct FileStage {
    outcome: FileOutcome,
    records: Option<RecordSet>,
}

struct DatasetStage {
    merged: RecordSet,
    cleaned: RecordSet,
    review: RecordSet,
    golden_keys: usize,
    groups: Vec<OrderLineGroup>,
}

/// Run the whole batch: every file in order, then the dataset-wide pass once.
///
/// Content problems never fail the run; only an unusable config does.
pub fn run(
    config: &PipelineConfig,
    schema: &Schema,
    files: &[String],
    loader: &dyn SourceLoader,
) -> Result<PipelineOutput, ReconError> {
    config.validate(schema)?;
    let taxonomy = config.name_taxonomy()?;
    let ctx = FileContext { config, schema, taxonomy: &taxonomy, loader };

    let mut collector = Collector::default();
    let mut outcomes = Vec::with_capacity(files.len());
    let mut merged = RecordSet::new(vec![columns::SOURCE_FILE.to_string()]);

    for file in files {
        let stage = process_file(file, &ctx, &mut collector);
        if let Some(records) = &stage.records {
            merged.append(records);
        }
        log::info!("{}: {}", stage.outcome.file, stage.outcome.state);
        outcomes.push(stage.outcome);
    }

    let dataset = reconcile_dataset(merged, config, &mut collector);

    Ok(PipelineOutput {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            price_tolerance: config.checks.price_tolerance,
        },
        report: collector.report,
        examples: collector.examples,
        files: outcomes,
        merged: dataset.merged,
        cleaned: dataset.cleaned,
        review: dataset.review,
        golden_keys: dataset.golden_keys,
        order_line_groups: dataset.groups,
    })
}

// ---------------------------------------------------------------------------
// Per-file phase
// ---------------------------------------------------------------------------

fn process_file(file: &str, ctx: &FileContext<'_>, collector: &mut Collector) -> FileStage {
    let name = naming::file_name(file);
    let mut outcome = FileOutcome {
        file: name.to_string(),
        state: FileState::Pending,
        rows_loaded: 0,
        lines_skipped: 0,
    };
    let rejected = |mut outcome: FileOutcome, state: FileState| {
        outcome.state = state;
        FileStage { outcome, records: None }
    };

    if let Some(message) = naming::check_extension(name, &ctx.config.input.extension) {
        collector.reject(IssueCategory::FileExtension, name, message, "Provide order files as .csv");
        return rejected(outcome, FileState::ExtensionRejected);
    }

    if let Some(message) = ctx.taxonomy.check(name) {
        log::warn!("{name}: file name does not match taxonomy");
        collector.reject(IssueCategory::FileName, name, message, "Verify file name format");
        return rejected(outcome, FileState::Rejected);
    }
    outcome.state = FileState::NameChecked;

    let raw = match ctx.loader.load(file) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("{name}: {e}");
            collector.reject(
                IssueCategory::FileLoad,
                name,
                e.to_string(),
                "Verify the file is readable and delimited as expected",
            );
            return rejected(outcome, FileState::Unreadable);
        }
    };
    outcome.state = FileState::Loaded;
    outcome.rows_loaded = raw.rows.len();
    outcome.lines_skipped = raw.skipped_lines;
    if raw.skipped_lines > 0 {
        log::warn!("{name}: skipped {} malformed line(s)", raw.skipped_lines);
    }

    let mut records = RecordSet::from_raw(&raw);
    records.set_column(columns::SOURCE_FILE, vec![Value::Str(name.to_string()); records.len()]);

    // Mixed types are judged on the data as loaded, before coercion
    let mixed = quality::check_mixed_types(&records);
    let schema_check = schema::validate_schema(&mut records, ctx.schema);
    outcome.state = FileState::SchemaChecked;

    let missing = schema_check.missing_columns();
    if !missing.is_empty() {
        collector.report.push(
            IssueCategory::MissingColumns,
            Finding::new(
                name,
                format!("Missing columns: {}", missing.join(" , ")),
                records.len(),
                "Ensure all required columns are present",
            ),
        );
        collector
            .examples
            .push_note(IssueCategory::MissingColumns, name, missing.join(", "));
        return rejected(outcome, FileState::ColumnRejected);
    }

    let rows = records.len();
    for message in schema_check.messages() {
        collector.report.push(
            IssueCategory::SchemaValidation,
            Finding::new(name, message, rows, "Verify and correct data types"),
        );
    }
    if !schema_check.is_clean() {
        collector
            .examples
            .push_records(IssueCategory::SchemaValidation, records.clone());
    }

    for null in quality::check_nulls(&records) {
        collector.report.push(
            IssueCategory::NullValue,
            Finding::new(
                name,
                format!("Null values in column {}", null.column),
                null.rows.len(),
                "Fill or remove null values",
            ),
        );
        collector.examples.push_records(IssueCategory::NullValue, null.rows);
    }

    let duplicates = quality::find_duplicates(&records, &ctx.config.checks.business_key);
    if !duplicates.is_empty() {
        collector.report.push(
            IssueCategory::Duplicate,
            Finding::new(name, "Found duplicates", duplicates.len(), "Remove duplicate rows"),
        );
        collector.examples.push_records(IssueCategory::Duplicate, duplicates);
    }

    for relation in [CUSTOMER_NAME, PRODUCT_NAME] {
        let violations = identity::check_identity(&records, relation);
        for v in &violations {
            collector.flagged_identities.insert((relation.key, v.key.clone()));
        }
        report_identity(collector, name, &records, relation, &violations, "");
    }

    if !mixed.is_empty() {
        collector.report.push(
            IssueCategory::MixedDataType,
            Finding::new(
                name,
                "Found mixed data types",
                mixed.len(),
                "Ensure consistent data types within each column",
            ),
        );
        collector
            .examples
            .push_records(IssueCategory::MixedDataType, mixed_type_table(&mixed));
    }

    price::add_price_per_unit(&mut records);
    outcome.state = FileState::Merged;
    FileStage { outcome, records: Some(records) }
}

fn report_identity(
    collector: &mut Collector,
    source: &str,
    records: &RecordSet,
    relation: IdentityRelation,
    violations: &[IdentityViolation],
    qualifier: &str,
) {
    if violations.is_empty() {
        return;
    }
    let (example_category, example) = if relation == PRODUCT_NAME {
        (
            IssueCategory::InconsistentProductId,
            identity::offending_records(records, relation, violations),
        )
    } else {
        (
            IssueCategory::InconsistentCustomerId,
            identity::violation_table(relation, violations),
        )
    };
    collector.report.push(
        IssueCategory::InconsistentAssociations,
        Finding::new(
            source,
            format!("{} associated with multiple {}s{qualifier}", relation.key, relation.attribute),
            violations.len(),
            format!("Ensure unique {}s for each {}", relation.attribute, relation.key),
        ),
    );
    collector.examples.push_records(example_category, example);
}

fn mixed_type_table(mixed: &[MixedTypeFinding]) -> RecordSet {
    RecordSet::from_rows(
        vec!["Column".into(), "Data Types".into()],
        mixed
            .iter()
            .map(|m| vec![Value::Str(m.column.clone()), Value::Str(m.kinds_label())])
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Dataset-wide phase
// ---------------------------------------------------------------------------

fn reconcile_dataset(
    mut merged: RecordSet,
    config: &PipelineConfig,
    collector: &mut Collector,
) -> DatasetStage {
    // Identity conflicts that only show up once files are combined
    for relation in [CUSTOMER_NAME, PRODUCT_NAME] {
        let cross_file: Vec<IdentityViolation> = identity::check_identity(&merged, relation)
            .into_iter()
            .filter(|v| !collector.flagged_identities.contains(&(relation.key, v.key.clone())))
            .collect();
        report_identity(collector, MULTIPLE_FILES, &merged, relation, &cross_file, " across files");
    }

    let golden = GoldenTable::build(&merged, &config.checks.context_key);
    log::info!("golden table: {} context key(s)", golden.len());

    let deviating = price::detect_deviations(&merged, &golden, config.checks.price_tolerance);
    if !deviating.is_empty() {
        collector.report.push(
            IssueCategory::PriceInconsistency,
            Finding::new(
                MULTIPLE_FILES,
                "Found price inconsistencies",
                deviating.len(),
                "Ensure consistent pricing per product within context",
            ),
        );
        collector
            .examples
            .push_records(IssueCategory::PriceInconsistency, merged.select(&deviating));
    }

    let anomalies = reconcile::sales_profit_anomalies(&merged);
    if !anomalies.is_empty() {
        collector.report.push(
            IssueCategory::SalesProfitInconsistency,
            Finding::new(
                MULTIPLE_FILES,
                "Found sales and profit inconsistencies",
                anomalies.len(),
                "Verify sales and profit data",
            ),
        );
        collector
            .examples
            .push_records(IssueCategory::SalesProfitInconsistency, merged.select(&anomalies));
    }

    let cross_dupes = reconcile::cross_file_duplicates(&merged, &config.checks.business_key);
    if !cross_dupes.is_empty() {
        collector.report.push(
            IssueCategory::CrossFileDuplicate,
            Finding::new(
                MULTIPLE_FILES,
                "Found cross-file duplicates",
                cross_dupes.len(),
                "Remove duplicate rows across files",
            ),
        );
        collector
            .examples
            .push_records(IssueCategory::CrossFileDuplicate, cross_dupes);
    }

    let groups = reconcile::classify_order_lines(&merged);
    let flags = reconcile::review_flags(merged.len(), &groups);
    merged.set_column(
        columns::NEEDS_REVIEW,
        flags.iter().map(|f| Value::Bool(*f)).collect(),
    );
    let parts = reconcile::partition(&merged, &flags);
    log::info!(
        "partitioned {} merged row(s): {} cleaned, {} for review",
        merged.len(),
        parts.cleaned.len(),
        parts.review.len()
    );

    DatasetStage {
        merged,
        cleaned: parts.cleaned,
        review: parts.review,
        golden_keys: golden.len(),
        groups,
    }
}
