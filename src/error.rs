//! Crate-wide error types.
//!
//! `thiserror` is listed in the teacher's `Cargo.toml` but never actually
//! used there (the teacher hand-rolls `GoatNsError` with manual `From`
//! impls); this crate puts it to work instead of replicating that
//! boilerplate.

use thiserror::Error;

/// Decoder failures, per RFC 1035 §4.1. All are non-fatal to the engine:
/// the offending datagram is dropped and the engine's state is untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("packet ended before a required field could be read")]
    Truncated,
    #[error("domain name label or pointer sequence is malformed")]
    MalformedName,
    #[error("a label exceeds 63 octets")]
    LabelTooLong,
    #[error("a name's cumulative expanded length exceeds 255 octets")]
    NameTooLong,
    #[error("a compression pointer refers to itself or forms a cycle")]
    PointerLoop,
    #[error("a compression pointer refers forward in the message")]
    PointerForward,
    #[error("an encoded message would exceed the configured frame size")]
    FrameTooLarge,
}

/// Errors returned by the engine's public API.
#[derive(Debug, Error)]
pub enum MdnsError {
    /// A received datagram failed to parse. Non-fatal; engine state is
    /// untouched. Hosts typically just log this at `warn` and move on.
    #[error("failed to parse incoming packet: {0}")]
    Parse(#[from] ParseError),

    /// `withdraw`/`set_rdata_*` given a handle that doesn't exist, a setter
    /// used on a record of the wrong type, or a publish call made after
    /// `shutdown()`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine has been told to shut down; further publish calls fail.
    #[error("engine is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}
