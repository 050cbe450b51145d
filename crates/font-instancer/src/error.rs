use std::result;

use fontmutator_variation::Location;

/// Error types for font-instancer.
///
/// These reject a design space as a whole. Problems confined to a single
/// glyph, kerning table or info field are reported as diagnostics on the
/// instance instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("design space has no sources")]
    NoSources,

    #[error("axis declared twice: {0}")]
    DuplicateAxis(String),

    #[error("source name used twice: {0}")]
    DuplicateSource(String),

    #[error("source '{name}' at {location} is invalid: {error}")]
    InvalidSource {
        name: String,
        location: Location,
        #[source]
        error: fontmutator_variation::Error,
    },

    #[error("invalid rules: {0}")]
    Rules(#[from] fontmutator_rules::Error),
}

pub type Result<T> = result::Result<T, Error>;
