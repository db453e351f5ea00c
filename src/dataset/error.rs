use crate::importers::{CsvImportError, MetadataImportError};

/// Fatal startup failure: the session cannot proceed without the dataset
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to load measurements: {0}")]
    Measurements(#[from] CsvImportError),
    #[error("Failed to load station metadata: {0}")]
    Metadata(#[from] MetadataImportError),
}
