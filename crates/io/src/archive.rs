// ZIP packaging of the data marts directory

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Compress `files` into `archive`, one entry per file named by its file name.
///
/// Entries are added in name order. Only the given files are archived, so
/// anything else sitting next to them stays out. Returns the number of entries.
pub fn zip_files(files: &[PathBuf], archive: &Path) -> Result<usize, String> {
    let mut entries: Vec<(String, &PathBuf)> = files
        .iter()
        .map(|path| {
            path.file_name()
                .map(|name| (name.to_string_lossy().into_owned(), path))
                .ok_or_else(|| format!("not a file path: {}", path.display()))
        })
        .collect::<Result<_, _>>()?;
    entries.sort();

    let file = File::create(archive)
        .map_err(|e| format!("cannot create {}: {e}", archive.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in &entries {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| format!("Failed to add {name} to archive: {e}"))?;
        zip.write_all(&bytes)
            .map_err(|e| format!("Failed to write {name} to archive: {e}"))?;
    }

    zip.finish()
        .map_err(|e| format!("Failed to finish archive: {e}"))?;
    log::info!("archived {} file(s) into {}", entries.len(), archive.display());
    Ok(entries.len())
}
