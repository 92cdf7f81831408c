//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args, emitted by clap)          |
//! | 3    | Findings present and `--strict` was given            |
//! | 4    | Config file failed to parse or validate              |
//! | 5    | I/O failure reading inputs or writing outputs        |
//! | 6    | `check-names` rejected at least one file name        |
//!
//! Content problems in the order files are never errors on their own: a run
//! that produced findings exits 0 unless `--strict` is set.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// clap exits with this code itself; kept here so the table is complete.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// `run --strict` finished but the issue report is not empty.
pub const EXIT_FINDINGS: u8 = 3;

/// Config could not be parsed, or parsed but failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Input directory unreadable or an output could not be written.
pub const EXIT_IO: u8 = 5;

/// At least one name given to `check-names` is not a valid extract name.
pub const EXIT_NAME_CHECK: u8 = 6;
