use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    /// The statement bytes could not be read.
    #[error("Read failure: {0}")]
    Read(#[from] std::io::Error),

    /// The content could not be interpreted as tabular data.
    #[error("Parse failure: {0}")]
    Parse(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl From<csv::Error> for WalletError {
    fn from(e: csv::Error) -> Self {
        WalletError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
