use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
