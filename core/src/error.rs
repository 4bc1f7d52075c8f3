use thiserror::Error;

/// Feil som avbryter en analyse. Datasparsomhet (ingen intervaller, tomme
/// pauser) er ikke feil – det gir tomme resultater.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("malformed value '{value}' in column '{column}' (row {row})")]
    MalformedValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("time_s must be strictly increasing (index {index}, t={time_s})")]
    NonMonotonicTime { index: usize, time_s: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid pace '{0}' (expected M:SS)")]
    InvalidPace(String),

    #[error("json error at {0}")]
    Json(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Pakker en serde_path_to_error-feil slik at stien til feltet følger med.
    pub(crate) fn from_json_path(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        CoreError::Json(format!("{path}: {}", err.into_inner()))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
