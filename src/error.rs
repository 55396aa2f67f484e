use std::num::NonZeroU64;

use thiserror::Error;

/// Failures raised by a `LotBuffer` and the gain calculation built on it.
///
/// None of these are retried internally. The caller decides whether the
/// condition ends the session or is re-prompted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("This cart is empty.")]
    Empty,
    #[error("This cart is full (capacity {capacity}).")]
    Full { capacity: usize },
    #[error("You don't have enough shares: requested {requested}, holding {held}.")]
    InsufficientShares {
        requested: NonZeroU64,
        held: NonZeroU64,
    },
    #[error("Overflow occurred while {0}")]
    Overflow(&'static str),
}

/// Central error type for everything above the buffer: configuration,
/// ledger lookups and the interactive session.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("Your entry is not listed: {0}")]
    UnknownSymbol(String),
    #[error("Unknown menu option '{0}'. Options: a, b, c, d")]
    UnknownCommand(String),
    #[error("Could not parse listing '{0}'. Format: SYMBOL:PRICE:RATE[:PRICE_DRIFT:RATE_DRIFT]")]
    InvalidListing(String),
    #[error("Could not parse Decimal")]
    DecimalParse(#[from] rust_decimal::Error),
    #[error("Symbol {0} is listed more than once")]
    DuplicateSymbol(String),
    #[error("Lot capacity must be at least 1")]
    ZeroCapacity,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
