use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad key column, negative tolerance, etc.).
    ConfigValidation(String),
    /// File-name taxonomy pattern does not compile.
    InvalidPattern { pattern: String, message: String },
    /// A source file could not be read or decoded.
    Load { file: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid file name pattern '{pattern}': {message}")
            }
            Self::Load { file, message } => write!(f, "cannot load '{file}': {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
