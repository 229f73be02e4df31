//! Error types for huffstream

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("no symbols to encode")]
    NoSymbols,

    #[error("invalid prefix tree: {0}")]
    InvalidTree(String),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("corrupt bitstream: {0}")]
    CorruptStream(String),

    #[error("symbol {0:#04x} missing from code table")]
    UnknownSymbol(u8),

    #[error("padding bit count {0} outside 0..=7")]
    InvalidPadding(u8),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
