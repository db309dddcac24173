use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unknown namespace prefix: {0}")]
    UnknownPrefix(String),

    #[error("XML document has no root element")]
    EmptyDocument,

    #[error("Second root element <{0}>")]
    MultipleRoots(String),

    #[error("Unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Can't find companion data file: {0}")]
    CompanionNotFound(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Layer has no features: {0}")]
    EmptyLayer(PathBuf),

    #[error("First feature has no geometry: {0}")]
    MissingGeometry(PathBuf),

    #[error("No temporal coverage found")]
    MissingTemporalCoverage,

    #[error("Malformed date in {field}: {value:?}")]
    MalformedDate { field: &'static str, value: String },

    #[error("Invalid metadata file name: {0}")]
    InvalidFileName(String),

    #[error("Output target already claimed by another input: {0}")]
    DuplicateOutput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
