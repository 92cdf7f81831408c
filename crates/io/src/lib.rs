// File I/O for order extracts and pipeline outputs

pub mod archive;
pub mod csv;
pub mod discover;
pub mod xlsx;

pub use archive::zip_files;
pub use csv::{read_file_as_utf8, PipeDelimitedLoader};
pub use discover::list_input_files;
pub use xlsx::write_issue_report;
