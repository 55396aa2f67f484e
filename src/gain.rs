use std::num::NonZeroU64;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{buffer::LotBuffer, error::BufferError, lot::Lot};

/// Result of matching one sale against the oldest lot in a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    pub symbol: String,
    pub quantity: NonZeroU64,
    pub unit_cost: Decimal,
    pub price: Decimal,
    /// Realized gain, negative for a loss.
    pub gain: Decimal,
    pub acquired: NaiveDate,
    /// The head lot after a partial sale, `None` when the lot was used up.
    pub remaining: Option<Lot>,
}

impl Sale {
    /// A settled record describing the shares that changed hands.
    pub fn settlement(&self) -> Lot {
        Lot::settled(
            self.symbol.clone(),
            self.quantity,
            self.unit_cost,
            self.price,
            self.acquired,
        )
    }
}

/// Checked multiplication that maps an `Option` to a `Result` in case the
/// operation overflows.
fn checked_mul(left: Decimal, right: Decimal) -> Result<Decimal, BufferError> {
    left.checked_mul(right).ok_or(BufferError::Overflow("multiplying"))
}

/// Checked subtraction that maps an `Option` to a `Result` in case the
/// operation overflows.
fn checked_sub(left: Decimal, right: Decimal) -> Result<Decimal, BufferError> {
    left.checked_sub(right).ok_or(BufferError::Overflow("subtracting"))
}

/// `(price - unit_cost) * quantity`.
pub fn realized_gain(
    price: Decimal,
    unit_cost: Decimal,
    quantity: NonZeroU64,
) -> Result<Decimal, BufferError> {
    checked_mul(checked_sub(price, unit_cost)?, Decimal::from(quantity.get()))
}

impl LotBuffer {
    /// Gain that selling `quantity` shares at `price` would realize, checked
    /// against the front lot without touching the buffer.
    pub fn gain_for(&self, quantity: NonZeroU64, price: Decimal) -> Result<Decimal, BufferError> {
        let front = self.front()?;
        let held = front.quantity();

        if quantity > held {
            warn!(symbol = front.symbol(), %quantity, %held, "sell exceeds front lot");
            return Err(BufferError::InsufficientShares {
                requested: quantity,
                held,
            });
        }

        realized_gain(price, front.unit_cost(), quantity)
    }

    /// Sell `quantity` shares out of the oldest lot at `price`.
    ///
    /// Only the front lot is considered. Asking for more than it holds fails
    /// with `InsufficientShares` and leaves the buffer as it was. Selling the
    /// whole lot removes it; selling part of it shrinks it where it stands so
    /// it is still matched first next time.
    pub fn sell(&mut self, quantity: NonZeroU64, price: Decimal) -> Result<Sale, BufferError> {
        let gain = self.gain_for(quantity, price)?;
        let front = self.front()?;
        let held = front.quantity();
        let mut sale = Sale {
            symbol: front.symbol().to_string(),
            quantity,
            unit_cost: front.unit_cost(),
            price,
            gain,
            acquired: front.acquired(),
            remaining: None,
        };

        match NonZeroU64::new(held.get() - quantity.get()) {
            Some(remaining) => {
                let lot = self.front_mut()?;
                lot.reduce(remaining, price);
                sale.remaining = Some(lot.clone());
            }
            None => {
                self.remove_front()?;
            }
        }

        debug!(symbol = %sale.symbol, %quantity, %price, %gain, "sale matched");
        Ok(sale)
    }
}
