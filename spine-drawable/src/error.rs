use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("asset not found: {path}")]
    AssetNotFound { path: String },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("asset '{path}' is not valid UTF-8")]
    InvalidUtf8 { path: String },

    #[error("failed to load texture '{path}': {message}")]
    Texture { path: String, message: String },

    #[error(transparent)]
    Spine(spine2d::Error),

    #[error("invalid drawable config: {message}")]
    Config { message: String },

    #[error("unknown animation: {name}")]
    UnknownAnimation { name: String },

    #[error("unknown skin: {name}")]
    UnknownSkin { name: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },
}

impl From<spine2d::Error> for Error {
    fn from(value: spine2d::Error) -> Self {
        match value {
            spine2d::Error::UnknownAnimation { name } => Error::UnknownAnimation { name },
            spine2d::Error::UnknownSkin { name } => Error::UnknownSkin { name },
            spine2d::Error::InvalidValue { message } => Error::InvalidValue { message },
            other => Error::Spine(other),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Config {
            message: value.to_string(),
        }
    }
}
