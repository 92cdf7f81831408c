// Delimited order extracts in, CSV outputs out

use std::io::Read;
use std::path::{Path, PathBuf};

use orderqa_recon::marts::{DataMart, MartCount};
use orderqa_recon::{RawTable, ReconError, RecordSet, SourceLoader};

/// Read a file and convert it to UTF-8.
///
/// A byte-order mark wins (UTF-8, UTF-16LE, UTF-16BE). Without one the bytes
/// must be strict UTF-8, otherwise they are decoded as Windows-1252.
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
    Ok(decode_bytes(bytes))
}

fn decode_bytes(bytes: Vec<u8>) -> String {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(&bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return decoded.into_owned();
    }

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Parse delimited text with a required header row.
///
/// Lines with more fields than the header are dropped and counted in
/// `skipped_lines`; shorter lines are padded with empty fields.
pub fn parse_delimited(content: &str, delimiter: u8) -> Result<RawTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        return Err("missing header row".to_string());
    }

    let mut table = RawTable {
        headers,
        ..RawTable::default()
    };
    let width = table.headers.len();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("skipping unreadable line: {e}");
                table.skipped_lines += 1;
                continue;
            }
        };
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            log::debug!("line {line}: {} fields, header has {width}", record.len());
            table.skipped_lines += 1;
            continue;
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        table.rows.push(row);
    }

    Ok(table)
}

/// Loads order extracts from one directory. File identifiers are names
/// relative to that directory.
#[derive(Debug, Clone)]
pub struct PipeDelimitedLoader {
    dir: PathBuf,
    delimiter: u8,
}

impl PipeDelimitedLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), delimiter: b'|' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl SourceLoader for PipeDelimitedLoader {
    fn load(&self, file: &str) -> Result<RawTable, ReconError> {
        let load_error = |message: String| ReconError::Load {
            file: file.to_string(),
            message,
        };
        let content = read_file_as_utf8(&self.dir.join(file)).map_err(load_error)?;
        parse_delimited(&content, self.delimiter).map_err(load_error)
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write a record set as comma-separated values with a header row.
pub fn write_records(set: &RecordSet, path: &Path) -> Result<usize, String> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
    writer.write_record(set.columns()).map_err(|e| e.to_string())?;
    for row in set.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())?;
    Ok(set.len())
}

/// One `<mart>.csv` per mart in `dir`, created if needed.
pub fn write_marts(marts: &[DataMart], dir: &Path) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("cannot create {}: {e}", dir.display()))?;
    let mut written = Vec::with_capacity(marts.len());
    for mart in marts {
        let path = dir.join(format!("{}.csv", mart.kind));
        write_records(&mart.records, &path)
            .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

pub fn write_mart_counts(counts: &[MartCount], path: &Path) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
    writer
        .write_record([
            "Data Mart System Name",
            "Count Rows",
            "Count Distinct Primary Key",
            "Count Distinct Row ID",
        ])
        .map_err(|e| e.to_string())?;
    for count in counts {
        writer
            .write_record([
                count.mart.to_string(),
                count.rows.to_string(),
                count.distinct_primary_keys.to_string(),
                count.distinct_row_ids.map(|n| n.to_string()).unwrap_or_default(),
            ])
            .map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
