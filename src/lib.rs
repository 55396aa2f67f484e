//! FIFO capital gain ledger.
//!
//! Purchases of a security are held as lots in a bounded circular buffer, one
//! buffer per symbol. A sale always consumes the oldest lot first and reports
//! the realized gain `(sale price - purchase price) * shares sold`.
//!
//! - `LotBuffer` - fixed capacity FIFO queue of `Lot`s
//! - `LotBuffer::sell` - matches a sale against the front lot
//! - `Ledger` - one buffer per listed symbol plus the running realized total
//! - `Market` - listed securities, their daily price drift and the day counter
//! - `Session` - the interactive buy/sell/view menu driving all of the above
//!
//! ```
//! use std::num::{NonZeroU64, NonZeroUsize};
//!
//! use chrono::NaiveDate;
//! use fifogain::{Lot, LotBuffer};
//! use rust_decimal::Decimal;
//!
//! let mut lots = LotBuffer::with_capacity(NonZeroUsize::new(10).unwrap());
//! let date = NaiveDate::from_ymd_opt(2018, 4, 29).unwrap();
//! lots.append(Lot::open("X", NonZeroU64::new(10).unwrap(), Decimal::from(100), date))
//!     .unwrap();
//!
//! let sale = lots.sell(NonZeroU64::new(4).unwrap(), Decimal::from(150)).unwrap();
//! assert_eq!(sale.gain, Decimal::from(200));
//! assert_eq!(lots.front().unwrap().quantity().get(), 6);
//! ```

pub mod buffer;
pub mod error;
pub mod gain;
pub mod ledger;
pub mod lot;
pub mod market;
pub mod session;

pub use buffer::LotBuffer;
pub use error::{BufferError, LedgerError};
pub use gain::{realized_gain, Sale};
pub use ledger::Ledger;
pub use lot::{Lot, LotSide};
pub use market::{Listing, Market};
pub use session::{Command, Outcome, Session};
