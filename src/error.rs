//! A dedicated error type for every failure mode in the data path: parsing,
//! wire decoding, storage corruption and the reload lifecycle.
use thiserror::Error;

/// A specific custom `Result` for all functions in this crate.
pub type DnsDbResult<T> = Result<T, DnsDbError>;

#[derive(Debug, Error)]
pub enum DnsDbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed text line: {0}")]
    ParseError(String),

    #[error("unknown record sigil: {0:?}")]
    BadRecordType(char),

    #[error("location bytes are neither empty nor exactly 2 bytes long (got {0})")]
    InvalidLocation(usize),

    #[error("RR row rejected: wildcard flag did not match the assembler's current mode")]
    WildcardMismatch,

    #[error("RR row rejected: location id did not match the requested location")]
    LocationMismatch,

    #[error("multi-value framing is truncated: expected {expected} more bytes, found {found}")]
    ShortValue { expected: usize, found: usize },

    #[error("unexpected end of buffer while decoding")]
    UnexpectedEof,

    #[error("delete targeted a key that does not exist: {0}")]
    NxKey(String),

    #[error("delete targeted a chunk that does not exist in key {0}")]
    NxVal(String),

    #[error("post-reload validation read returned no data for the validation key")]
    ValidationKeyNotFound,

    #[error("reload did not complete before the deadline")]
    ReloadTimeout,

    #[error("RDATA length exceeds 16 bits")]
    IntegerOverflow,

    #[error("domain name exceeds 255 octets or a label exceeds 63 octets")]
    NameTooLong,

    #[error("domain name is empty")]
    EmptyName,

    #[error("storage backend error: {0}")]
    Store(String),
}
