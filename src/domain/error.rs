//! Domain error types.

/// Top-level error type for oppscan.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OppscanError {
    #[error("data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid strategy config: {reason}")]
    InvalidStrategyConfig { reason: String },

    #[error("malformed price series for {symbol}: {reason}")]
    MalformedSeries { symbol: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("io error: {reason}")]
    Io { reason: String },
}

impl From<std::io::Error> for OppscanError {
    fn from(err: std::io::Error) -> Self {
        OppscanError::Io {
            reason: err.to_string(),
        }
    }
}

impl From<&OppscanError> for std::process::ExitCode {
    fn from(err: &OppscanError) -> Self {
        let code: u8 = match err {
            OppscanError::Io { .. } | OppscanError::Report { .. } => 1,
            OppscanError::ConfigParse { .. }
            | OppscanError::ConfigMissing { .. }
            | OppscanError::ConfigInvalid { .. } => 2,
            OppscanError::InvalidStrategyConfig { .. } => 3,
            OppscanError::DataUnavailable { .. } | OppscanError::InsufficientHistory { .. } => 4,
            OppscanError::MalformedSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
