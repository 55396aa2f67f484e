use std::{fmt::Display, str::FromStr};

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::LedgerError;

/// A tradeable security with its current quote and how the quote moves
/// from one session day to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub symbol: String,
    pub price: Decimal,
    /// Rate of return in percent, shown next to the price.
    pub rate: Decimal,
    pub price_drift: Decimal,
    pub rate_drift: Decimal,
}

impl Listing {
    pub fn new(
        symbol: impl Into<String>,
        price: Decimal,
        rate: Decimal,
        price_drift: Decimal,
        rate_drift: Decimal,
    ) -> Self {
        Listing {
            symbol: symbol.into(),
            price,
            rate,
            price_drift,
            rate_drift,
        }
    }

    /// The listing a session starts with when none are configured.
    pub fn defaults() -> Vec<Listing> {
        vec![
            Listing::new("AMZN", Decimal::new(150000, 2), Decimal::new(56, 2), Decimal::new(-20000, 2), Decimal::new(344, 1)),
            Listing::new("FB", Decimal::new(18000, 2), Decimal::new(149, 2), Decimal::new(250000, 2), Decimal::new(20000, 1)),
            Listing::new("AAPL", Decimal::new(18000, 2), Decimal::new(392, 2), Decimal::new(32050, 2), Decimal::new(200, 1)),
        ]
    }

    fn step(&mut self) {
        // Both saturate at the Decimal range. Prices are also clamped at
        // zero; rates may go negative.
        self.price = self
            .price
            .saturating_add(self.price_drift)
            .max(Decimal::ZERO);
        self.rate = self.rate.saturating_add(self.rate_drift);
    }
}

impl FromStr for Listing {
    type Err = LedgerError;

    /// Parses `SYMBOL:PRICE:RATE[:PRICE_DRIFT:RATE_DRIFT]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
        let invalid = || LedgerError::InvalidListing(s.to_string());

        let (symbol, price, rate, drifts) = match parts.as_slice() {
            [symbol, price, rate] => (symbol, price, rate, None),
            [symbol, price, rate, price_drift, rate_drift] => {
                (symbol, price, rate, Some((price_drift, rate_drift)))
            }
            _ => return Err(invalid()),
        };

        if symbol.is_empty() {
            return Err(invalid());
        }
        let price = Decimal::from_str(price)?;
        if price < Decimal::ZERO {
            return Err(invalid());
        }
        let rate = Decimal::from_str(rate)?;
        let (price_drift, rate_drift) = match drifts {
            Some((price_drift, rate_drift)) => {
                (Decimal::from_str(price_drift)?, Decimal::from_str(rate_drift)?)
            }
            None => (Decimal::ZERO, Decimal::ZERO),
        };

        Ok(Listing::new(
            symbol.to_uppercase(),
            price,
            rate,
            price_drift,
            rate_drift,
        ))
    }
}

impl Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<8}{:>12.2}  ({}%)", self.symbol, self.price, self.rate)
    }
}

/// Simulated market: the listed securities plus the session day counter.
#[derive(Debug, Clone)]
pub struct Market {
    listings: Vec<Listing>,
    day: u32,
    start_date: NaiveDate,
}

impl Market {
    pub fn new(listings: Vec<Listing>, start_date: NaiveDate) -> Self {
        Market {
            listings,
            day: 1,
            start_date,
        }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.listings.iter().map(|listing| listing.symbol.as_str())
    }

    /// Current price of `symbol`. Lookup ignores case.
    pub fn quote(&self, symbol: &str) -> Result<&Listing, LedgerError> {
        self.listings
            .iter()
            .find(|listing| listing.symbol.eq_ignore_ascii_case(symbol.trim()))
            .ok_or_else(|| LedgerError::UnknownSymbol(symbol.trim().to_string()))
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Calendar date of the current session day.
    pub fn date(&self) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(u64::from(self.day - 1)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Move every quote by its drift and start the next day.
    pub fn advance_day(&mut self) {
        for listing in &mut self.listings {
            listing.step();
        }
        self.day = self.day.saturating_add(1);
        debug!(day = self.day, "market advanced");
    }
}
