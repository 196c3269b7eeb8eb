//! Domain error types.

/// Top-level error type for tradebot.
#[derive(Debug, thiserror::Error)]
pub enum TradebotError {
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

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("parameter grid for {strategy} is empty")]
    EmptyGrid { strategy: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<&TradebotError> for std::process::ExitCode {
    fn from(err: &TradebotError) -> Self {
        let code: u8 = match err {
            TradebotError::Io(_) | TradebotError::Json(_) => 1,
            TradebotError::ConfigParse { .. }
            | TradebotError::ConfigMissing { .. }
            | TradebotError::ConfigInvalid { .. } => 2,
            TradebotError::UnknownStrategy { .. } | TradebotError::EmptyGrid { .. } => 4,
            TradebotError::Data { .. } | TradebotError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
