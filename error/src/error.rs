use std::fmt::Display;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HospitalError {
    #[error("wrapped error: {0}")]
    WrappedError(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("wide-column store error: {0}")]
    WideColumn(String),

    #[error("document store error: {0}")]
    Document(String),

    #[error("graph store error: {0}")]
    Graph(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("default error: {0}")]
    DefaultError(String),
}

impl HospitalError {
    pub fn config<E: Display>(err: E) -> Self {
        HospitalError::Config(err.to_string())
    }

    pub fn wide_column<E: Display>(err: E) -> Self {
        HospitalError::WideColumn(err.to_string())
    }

    pub fn document<E: Display>(err: E) -> Self {
        HospitalError::Document(err.to_string())
    }

    pub fn graph<E: Display>(err: E) -> Self {
        HospitalError::Graph(err.to_string())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        HospitalError::InvalidInput(msg.into())
    }
}

impl From<String> for HospitalError {
    fn from(s: String) -> Self {
        HospitalError::DefaultError(s)
    }
}

impl From<&str> for HospitalError {
    fn from(s: &str) -> Self {
        HospitalError::DefaultError(s.to_string())
    }
}
