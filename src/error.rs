use crate::value::ValueType;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error while processing the geozero source.")]
    GeozeroError(#[from] geozero::error::GeozeroError),

    #[error("Cannot parse json ({0})")]
    SerdeError(#[from] serde_json::error::Error),

    #[error("Cannot parse json as array: {0}")]
    NotAnArray(String),

    #[error("Cannot convert json array element {index} to {target:?}: {text}")]
    Conversion {
        index: usize,
        text: String,
        target: ValueType,
    },

    #[error("Coordinate transform failed: {0}")]
    Transform(String),
}

pub type Result<T> = std::result::Result<T, Error>;

