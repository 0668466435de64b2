use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool reads a document, applies a mapping, or emits a workbook.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the input document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Raised when the input bytes are not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Raised when a TOML mapping document cannot be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Raised when a mapping template cannot be serialised to TOML.
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// Raised when a JSON mapping document cannot be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook does not have the expected shape.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the mapping configuration is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Raised when a resolved sheet name exceeds Excel's limit.
    #[error("sheet name '{name}' for '{kind}' exceeds the 31 character limit")]
    SheetNameTooLong { kind: String, name: String },

    /// Raised when a resolved sheet name is rejected by Excel.
    #[error("sheet name '{name}' for '{kind}' is not a valid Excel sheet name")]
    InvalidSheetName { kind: String, name: String },

    /// Raised when the conversion produced no rows at all.
    #[error("no data to write: no entity produced a row")]
    NoData,

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the mapping file does not exist.
    #[error("configuration file not found: {0}")]
    MissingConfig(PathBuf),

    /// Raised when the output exists and overwriting was not requested.
    #[error("output file {0} already exists; pass --force to overwrite it")]
    OutputExists(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
