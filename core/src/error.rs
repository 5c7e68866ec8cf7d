//! # Errors
//!
//! One error enum serves both crates; `derive_more` supplies the
//! `Display` and `From` impls.

use derive_more::{Display, From};

/// Error type shared across the generator.
///
/// Only `std::io::Error` gets an automatic `From`. A bare `String`
/// converts to `General`, which keeps `Parse` deliberate: it must be
/// constructed at the site that recognized the bad input, with the
/// offending token in the message.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Filesystem failures, surfaced by the driver's walk and writes.
    #[display("io: {_0}")]
    Io(std::io::Error),

    /// Malformed input: source syntax, combined types, tag grammars.
    /// Bubbles up to the driver instead of degrading to a fallback.
    #[from(ignore)]
    #[display("parse: {_0}")]
    Parse(String),

    /// Anything without a more specific home.
    #[display("{_0}")]
    General(String),
}

impl std::error::Error for AppError {}

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;
