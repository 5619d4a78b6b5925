use thiserror::Error;

/// Address bar and history failures
#[derive(Error, Debug)]
pub enum NavigationError {
    /// Blank or whitespace-only address bar input
    #[error("Please enter a website URL")]
    EmptyInput,

    /// Input that does not form an absolute URL even after adding `https://`
    #[error("{0:?} is not a valid web address")]
    InvalidUrl(String),

    #[error("History unavailable: {0}")]
    History(#[from] ferry_storage::StorageError),
}
