//! Error types for CLI operations.

use thiserror::Error;

/// Fatal errors that end a run before its summary
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration parsing or validation error
    #[error("{0}")]
    Config(#[from] contracts::ContractError),

    /// Session bootstrap failed
    #[error("{0}")]
    Session(#[from] session::SessionError),

    /// Stream could not be opened
    #[error("{0}")]
    Stream(#[from] ingestion::IngestionError),

    /// A sink could not be created (e.g. the output file)
    #[error("{0}")]
    Sink(#[from] dispatcher::DispatcherError),
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
