//! Result and Error types for mcnptools-check

/// Type alias for Result<T, check::Error>
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the `mcnptools-check` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to set up logging")]
    FailedLogger(#[from] log::SetLoggerError),

    #[error(transparent)]
    DeckError(#[from] mcnptools_deck::Error),
}
