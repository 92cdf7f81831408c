// Excel export of the issue report (xlsx only)
//
// Three sheets: per-finding summary with distinct Row ID counts, the offending
// records behind each category, and the flat quality log.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use orderqa_recon::report::{Example, IssueExamples, IssueReport};
use orderqa_recon::Value;

pub const SUMMARY_SHEET: &str = "Inconsistencies_Summary";
pub const EXAMPLES_SHEET: &str = "Inconsistencies_Examples";
pub const QUALITY_SHEET: &str = "Quality_Report";

/// Excel's hard row limit, header included.
const MAX_ROWS: usize = 1_048_576;

const TYPE_COLUMN: &str = "Inconsistency Type";
const NOTE_COLUMN: &str = "Example";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub summary_rows: usize,
    pub example_rows: usize,
    pub quality_rows: usize,
    /// Example rows dropped at the sheet row limit.
    pub examples_truncated: usize,
}

pub fn write_issue_report(
    report: &IssueReport,
    examples: &IssueExamples,
    path: &Path,
) -> Result<ReportStats, String> {
    let mut stats = ReportStats::default();
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    // Summary
    let summary = report.summary_rows(examples);
    let sheet = add_sheet(&mut workbook, SUMMARY_SHEET)?;
    write_header(
        sheet,
        &["Inconsistency Type", "Description", "Suggestion to handle", "Distinct Count of [Row Id]"],
        &header,
    )?;
    for (i, row) in summary.iter().enumerate() {
        let r = (i + 1) as u32;
        write_text(sheet, r, 0, row.category.label())?;
        write_text(sheet, r, 1, &row.description)?;
        write_text(sheet, r, 2, &row.remediation)?;
        write_count(sheet, r, 3, row.distinct_row_ids)?;
    }
    stats.summary_rows = summary.len();

    // Examples (only when there are any)
    if examples.iter().any(|(_, e)| !e.is_empty()) {
        let sheet = add_sheet(&mut workbook, EXAMPLES_SHEET)?;
        let (written, truncated) = write_examples(sheet, examples, &header)?;
        stats.example_rows = written;
        stats.examples_truncated = truncated;
        if truncated > 0 {
            log::warn!("{EXAMPLES_SHEET}: dropped {truncated} row(s) past the sheet row limit");
        }
    }

    // Quality log
    let quality = report.quality_rows();
    let sheet = add_sheet(&mut workbook, QUALITY_SHEET)?;
    write_header(
        sheet,
        &["Issue Type", "File", "Description", "Number of Affected Rows", "Plan to Resolve"],
        &header,
    )?;
    for (i, row) in quality.iter().enumerate() {
        let r = (i + 1) as u32;
        write_text(sheet, r, 0, row.category.label())?;
        write_text(sheet, r, 1, &row.source)?;
        write_text(sheet, r, 2, &row.description)?;
        write_count(sheet, r, 3, row.affected_rows)?;
        write_text(sheet, r, 4, &row.remediation)?;
    }
    stats.quality_rows = quality.len();

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(stats)
}

/// Union of every example's columns, in first-seen order, after the type column.
fn example_columns(examples: &IssueExamples) -> Vec<String> {
    let mut columns = vec![TYPE_COLUMN.to_string()];
    let mut has_notes = false;
    for (_, list) in examples.iter() {
        for example in list {
            match example {
                Example::Records(set) => {
                    for c in set.columns() {
                        if !columns.contains(c) {
                            columns.push(c.clone());
                        }
                    }
                }
                Example::Note { .. } => has_notes = true,
            }
        }
    }
    if has_notes && !columns.iter().any(|c| c == NOTE_COLUMN) {
        columns.push(NOTE_COLUMN.to_string());
    }
    columns
}

fn write_examples(
    sheet: &mut Worksheet,
    examples: &IssueExamples,
    header: &Format,
) -> Result<(usize, usize), String> {
    let columns = example_columns(examples);
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    write_header(sheet, &names, header)?;
    let col_of = |name: &str| columns.iter().position(|c| c == name).map(|i| i as u16);
    let note_col = col_of(NOTE_COLUMN);

    let mut row: usize = 1;
    let mut truncated = 0;
    for (category, list) in examples.iter() {
        for example in list {
            match example {
                Example::Records(set) => {
                    let targets: Vec<Option<u16>> = set.columns().iter().map(|c| col_of(c)).collect();
                    for values in set.rows() {
                        if row >= MAX_ROWS {
                            truncated += 1;
                            continue;
                        }
                        let r = row as u32;
                        write_text(sheet, r, 0, category.label())?;
                        for (value, target) in values.iter().zip(&targets) {
                            if let Some(col) = target {
                                write_value(sheet, r, *col, value)?;
                            }
                        }
                        row += 1;
                    }
                }
                Example::Note { source, detail } => {
                    if row >= MAX_ROWS {
                        truncated += 1;
                        continue;
                    }
                    let r = row as u32;
                    write_text(sheet, r, 0, category.label())?;
                    if let Some(col) = note_col {
                        write_text(sheet, r, col, &format!("{source}: {detail}"))?;
                    }
                    row += 1;
                }
            }
        }
    }
    Ok((row - 1, truncated))
}

// ---------------------------------------------------------------------------
// Cell helpers
// ---------------------------------------------------------------------------

fn add_sheet<'a>(workbook: &'a mut Workbook, name: &str) -> Result<&'a mut Worksheet, String> {
    workbook
        .add_worksheet()
        .set_name(name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", name, e))
}

fn write_header(sheet: &mut Worksheet, names: &[&str], format: &Format) -> Result<(), String> {
    for (col, name) in names.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *name, format)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }
    Ok(())
}

fn write_text(sheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<(), String> {
    sheet
        .write_string(row, col, text)
        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row, col, e))?;
    Ok(())
}

fn write_count(sheet: &mut Worksheet, row: u32, col: u16, n: usize) -> Result<(), String> {
    sheet
        .write_number(row, col, n as f64)
        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row, col, e))?;
    Ok(())
}

fn write_value(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<(), String> {
    let result = match value {
        Value::Null => return Ok(()),
        Value::Bool(b) => sheet.write_boolean(row, col, *b).map(|_| ()),
        Value::Int(i) => sheet.write_number(row, col, *i as f64).map(|_| ()),
        Value::Float(f) => sheet.write_number(row, col, *f).map(|_| ()),
        Value::Str(s) => sheet.write_string(row, col, s.as_str()).map(|_| ()),
    };
    result.map_err(|e| format!("Failed to write cell ({}, {}): {}", row, col, e))
}
