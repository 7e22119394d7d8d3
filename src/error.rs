use thiserror::Error;

use crate::spec::ElementType;

pub type Result<T> = std::result::Result<T, Error>;

/// An error raised while parsing a document or building a command.
///
/// Parse errors latch the parser that produced them: once a parser has
/// returned an `Err`, further input is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A byte at tag position did not decode to a known element type.
    #[error("invalid element tag")]
    InvalidTag,

    /// A recognized but unsupported element type (regexp, scoped js).
    #[error("unsupported element type {0:?}")]
    UnsupportedType(ElementType),

    /// A length prefix outside the legal range for its element type.
    #[error("invalid length {0}")]
    InvalidLength(i32),

    /// A string or document payload was not null-terminated.
    #[error("expected null terminator")]
    MissingTerminator,

    /// Documents nested deeper than the parser supports.
    #[error("document nesting too deep")]
    DepthExceeded,

    /// More documents passed to a single write command than the server
    /// accepts in one batch.
    #[error("write batch of {0} exceeds the maximum document count")]
    TooManyDocuments(usize),
}
