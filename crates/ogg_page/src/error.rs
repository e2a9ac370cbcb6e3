use std::fmt::Debug;

use nom::{error::VerboseError, Err};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PageError>;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("page body of {0} bytes does not fit in a single page")]
    BodyTooLarge(usize),
    #[error("parsing error: {0}")]
    Nom(String),
}

impl<T: Debug> From<Err<VerboseError<T>>> for PageError {
    fn from(err: Err<VerboseError<T>>) -> Self {
        match err {
            Err::Incomplete(needed) => Self::Nom(format!("incomplete input: {:?}", needed)),
            Err::Error(err) | Err::Failure(err) => Self::Nom(format!("{:?}", err)),
        }
    }
}
