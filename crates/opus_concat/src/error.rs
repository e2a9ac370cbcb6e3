use ebml::EbmlError;
use ogg_page::PageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConcatError>;

#[derive(Debug, Error)]
pub enum ConcatError {
    #[error("malformed container: {0}")]
    MalformedContainer(String),
    #[error("input is neither an Ogg nor a WebM container")]
    UnknownFormat,
    #[error("no inputs to concatenate")]
    EmptyInput,
    #[error("ogg page: {0}")]
    Page(#[from] PageError),
    #[error("ebml: {0}")]
    Ebml(#[from] EbmlError),
}

impl ConcatError {
    /// Whether the input itself was broken, including errors raised while decoding it.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedContainer(_) | Self::Page(_) | Self::Ebml(_)
        )
    }
}
