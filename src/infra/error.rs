use thiserror::Error;

/// Failures surfaced by the entity and object backends.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {message}")]
    Unavailable { message: String },
    #[error("table `{table}` not found")]
    TableNotFound { table: String },
    #[error("index `{index}` not found on table `{table}`")]
    IndexNotFound { table: String, index: String },
    #[error("table `{table}` already exists")]
    TableExists { table: String },
    #[error("item is missing key attribute `{attr}`")]
    MissingKey { attr: &'static str },
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl BackendError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    pub fn index_not_found(table: impl Into<String>, index: impl Into<String>) -> Self {
        Self::IndexNotFound {
            table: table.into(),
            index: index.into(),
        }
    }
}
