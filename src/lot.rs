use std::{fmt::Display, num::NonZeroU64};

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Whether a record describes a lot still held or a sale that closed shares.
/// Only affects how the record is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotSide {
    Open,
    Settled,
}

/// One purchase of a security, tracked until every share has been sold.
///
/// `unit_cost` is the cost basis and never changes once the lot exists.
/// `mark` is the last market price shown alongside the lot and is purely
/// cosmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    symbol: String,
    quantity: NonZeroU64,
    unit_cost: Decimal,
    mark: Decimal,
    side: LotSide,
    acquired: NaiveDate,
}

impl Lot {
    /// Create an open lot bought at `unit_cost` on `acquired`.
    pub fn open(
        symbol: impl Into<String>,
        quantity: NonZeroU64,
        unit_cost: Decimal,
        acquired: NaiveDate,
    ) -> Self {
        Lot {
            symbol: symbol.into(),
            quantity,
            unit_cost,
            mark: unit_cost,
            side: LotSide::Open,
            acquired,
        }
    }

    /// Create a settled record of `quantity` shares sold at `price`.
    pub(crate) fn settled(
        symbol: impl Into<String>,
        quantity: NonZeroU64,
        unit_cost: Decimal,
        price: Decimal,
        acquired: NaiveDate,
    ) -> Self {
        Lot {
            symbol: symbol.into(),
            quantity,
            unit_cost,
            mark: price,
            side: LotSide::Settled,
            acquired,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn quantity(&self) -> NonZeroU64 {
        self.quantity
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn mark(&self) -> Decimal {
        self.mark
    }

    pub fn side(&self) -> LotSide {
        self.side
    }

    pub fn acquired(&self) -> NaiveDate {
        self.acquired
    }

    /// Shrink the lot after a partial sale. The cost basis is left alone;
    /// only the display mark follows the sale price.
    pub(crate) fn reduce(&mut self, remaining: NonZeroU64, price: Decimal) {
        self.quantity = remaining;
        self.mark = price;
    }
}

impl Display for Lot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} share(s) of {} at ${:.2} each.",
            self.quantity, self.symbol, self.mark
        )
    }
}
