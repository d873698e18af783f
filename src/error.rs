use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Malformed coordinates '{coordinates}': {reason}")]
    CoordinateFormat { coordinates: String, reason: String },

    #[error("Boundary load error: {0}")]
    BoundaryLoad(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl CleanerError {
    /// Whether the error aborts the whole run rather than a single record
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CleanerError::CoordinateFormat { .. })
    }
}

pub type Result<T> = std::result::Result<T, CleanerError>;
