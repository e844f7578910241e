use rill_core::StreamError;
use rill_runtime::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("unknown scenario: {name}")]
    UnknownScenario { name: String },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::InvalidArgument { .. } | Self::UnknownScenario { .. } => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
