//! Domain error types.
//!
//! Business rejections (insufficient capital, empty input) are not errors;
//! they surface as [`crate::domain::execution::EntryResult::Rejected`] or an
//! empty report. Only configuration, I/O and caller contract violations are
//! represented here.

use chrono::NaiveDate;

/// A caller bug: the engine refuses to continue rather than produce a
/// silently wrong result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractViolation {
    #[error("bar series is not sorted ascending at index {index}")]
    UnsortedSeries { index: usize },

    #[error("bar series contains duplicate date {date}")]
    DuplicateDate { date: NaiveDate },

    #[error("series length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("position {id} is already closed")]
    PositionAlreadyClosed { id: usize },

    #[error("position {id} was never opened")]
    UnknownPosition { id: usize },
}

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("{symbol}: {bars} bars loaded, at least {minimum} required")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SigtraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            SigtraderError::Io(_) => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::DataLoad { .. }
            | SigtraderError::NoData { .. }
            | SigtraderError::InsufficientData { .. } => 5,
            SigtraderError::Contract(_) => 6,
            SigtraderError::Json(_) => 7,
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
