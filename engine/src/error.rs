//! Error types for the engine.
//!
//! Almost nothing in the animation core can fail at runtime. The fallible
//! edges are configuration loading and the persisted debug flag.

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::store::StoreError;

/// Engine result type alias
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error taxonomy
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to parse context facts: {0}")]
    Context(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_transparent() {
        let err: EngineError = ConfigError::ValidationError("frame interval".into()).into();
        assert_eq!(
            err.to_string(),
            "Invalid configuration value: frame interval"
        );
    }

    #[test]
    fn context_errors_mention_context() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = EngineError::from(parse);
        assert!(err.to_string().starts_with("Failed to parse context facts"));
    }
}
