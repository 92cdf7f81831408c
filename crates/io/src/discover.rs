// Input directory enumeration

use std::path::Path;

/// Names of the regular files directly inside `dir`, sorted.
///
/// Every file is returned regardless of extension; rejecting the wrong ones is
/// the pipeline's job so they show up in the report.
pub fn list_input_files(dir: &Path) -> Result<Vec<String>, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("cannot read input directory {}: {e}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| e.to_string())?;
        let file_type = entry.file_type().map_err(|e| e.to_string())?;
        if !file_type.is_file() {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().into_owned());
    }
    files.sort();
    log::debug!("found {} input file(s) in {}", files.len(), dir.display());
    Ok(files)
}
