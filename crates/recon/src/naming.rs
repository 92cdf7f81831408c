use regex::Regex;

use crate::error::ReconError;

/// `<6 digits>_Orders_<YYYY>_<MM>_<DD>_<HH>_<MM>_<SS>.csv`
pub const DEFAULT_NAME_PATTERN: &str = r"^\d{6}_Orders_\d{4}_\d{2}_\d{2}_\d{2}_\d{2}_\d{2}\.csv$";

pub const DEFAULT_EXTENSION: &str = ".csv";

/// `Some(message)` when `file` does not carry `extension`.
pub fn check_extension(file: &str, extension: &str) -> Option<String> {
    if file.ends_with(extension) {
        None
    } else {
        Some(format!("Invalid file extension: {file}"))
    }
}

/// Compiled file-name taxonomy.
#[derive(Debug, Clone)]
pub struct NameTaxonomy {
    pattern: Regex,
}

impl NameTaxonomy {
    pub fn new(pattern: &str) -> Result<Self, ReconError> {
        let pattern = Regex::new(pattern).map_err(|e| ReconError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    /// `Some(message)` when `file_name` does not match the taxonomy.
    pub fn check(&self, file_name: &str) -> Option<String> {
        if self.pattern.is_match(file_name) {
            None
        } else {
            Some(format!("Invalid file name format: {file_name}"))
        }
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Last path component of a file identifier (either separator).
pub fn file_name(identifier: &str) -> &str {
    identifier
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(identifier)
}
