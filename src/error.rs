use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProdcatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[cfg(feature = "xlsx")]
    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Column '{0}' not found in input")]
    MissingColumn(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Rules error: {0}")]
    Rules(String),
}

pub type Result<T> = std::result::Result<T, ProdcatError>;
