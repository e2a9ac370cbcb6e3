use std::fmt::Debug;

use nom::{error::VerboseError, Err};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EbmlError>;

#[derive(Debug, Error)]
pub enum EbmlError {
    #[error("variable length integer at offset {offset} is wider than 8 bytes")]
    InvalidVintWidth { offset: usize },
    #[error("invalid lacing: {0}")]
    InvalidLacing(String),
    #[error("parsing error: {0}")]
    Nom(String),
}

impl<T: Debug> From<Err<VerboseError<T>>> for EbmlError {
    fn from(err: Err<VerboseError<T>>) -> Self {
        match err {
            Err::Incomplete(needed) => Self::Nom(format!("incomplete input: {:?}", needed)),
            Err::Error(err) | Err::Failure(err) => Self::Nom(format!("{:?}", err)),
        }
    }
}
