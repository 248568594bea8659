use thiserror::Error;

pub type StatResult<T> = Result<T, StatError>;

#[derive(Error, Debug)]
pub enum StatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<calamine::Error> for StatError {
    fn from(err: calamine::Error) -> Self {
        StatError::Read(err.to_string())
    }
}

impl From<serde_yaml::Error> for StatError {
    fn from(err: serde_yaml::Error) -> Self {
        StatError::Serialize(err.to_string())
    }
}

impl From<serde_json::Error> for StatError {
    fn from(err: serde_json::Error) -> Self {
        StatError::Serialize(err.to_string())
    }
}
