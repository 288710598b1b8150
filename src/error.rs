use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("PNML document is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("PNML data does not contain a 'net' element")]
    MissingNet,
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {what}: {message}")]
    Json { what: &'static str, message: String },
    #[error("invalid state mapping: {0}")]
    InvalidMapping(String),
}

impl Error {
    /// Errors that make the reference model itself unusable.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Xml(_) | Error::MissingNet)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
