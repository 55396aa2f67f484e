use std::{
    collections::HashMap,
    num::{NonZeroU64, NonZeroUsize},
};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    buffer::LotBuffer,
    error::{BufferError, LedgerError},
    gain::Sale,
    lot::Lot,
};

/// Open lots for every listed security, one FIFO buffer per symbol, plus the
/// realized gain accumulated over the session.
///
/// A sale only ever consumes lots of the symbol being sold. A buy or sell
/// that fails leaves the buffers, the realized total and the transaction
/// records exactly as they were.
#[derive(Debug)]
pub struct Ledger {
    buffers: HashMap<String, LotBuffer>,
    realized: Decimal,
    last_transactions: HashMap<String, Lot>,
}

impl Ledger {
    pub fn new<'a>(symbols: impl IntoIterator<Item = &'a str>, capacity: NonZeroUsize) -> Self {
        let buffers = symbols
            .into_iter()
            .map(|symbol| (symbol.to_uppercase(), LotBuffer::with_capacity(capacity)))
            .collect();

        Ledger {
            buffers,
            realized: Decimal::ZERO,
            last_transactions: HashMap::new(),
        }
    }

    /// Record a purchase and return the lot now at the tail of the symbol's
    /// buffer.
    pub fn buy(
        &mut self,
        symbol: &str,
        quantity: NonZeroU64,
        price: Decimal,
        date: NaiveDate,
    ) -> Result<&Lot, LedgerError> {
        let key = Self::key(symbol);
        let buffer = self
            .buffers
            .get_mut(&key)
            .ok_or_else(|| LedgerError::UnknownSymbol(symbol.trim().to_string()))?;

        let lot = Lot::open(key.clone(), quantity, price, date);
        buffer.append(lot.clone())?;
        info!(lot = %lot, "bought");
        self.last_transactions.insert(key, lot);

        Ok(buffer.last()?)
    }

    /// Sell shares out of the oldest lot held for `symbol` and add the result
    /// to the running realized total.
    pub fn sell(
        &mut self,
        symbol: &str,
        quantity: NonZeroU64,
        price: Decimal,
    ) -> Result<Sale, LedgerError> {
        let key = Self::key(symbol);
        let buffer = self
            .buffers
            .get_mut(&key)
            .ok_or_else(|| LedgerError::UnknownSymbol(symbol.trim().to_string()))?;

        // The new total must fit before any lot is consumed.
        let gain = buffer.gain_for(quantity, price)?;
        let realized = self
            .realized
            .checked_add(gain)
            .ok_or(BufferError::Overflow("adding"))?;

        let sale = buffer.sell(quantity, price)?;
        self.realized = realized;
        self.last_transactions.insert(key, sale.settlement());
        info!(symbol = %sale.symbol, %quantity, gain = %sale.gain, "sold");

        Ok(sale)
    }

    /// Longest-held lot of `symbol`.
    pub fn oldest(&self, symbol: &str) -> Result<&Lot, LedgerError> {
        Ok(self.buffer(symbol)?.front()?)
    }

    /// Most recently bought lot of `symbol` that is still held.
    pub fn latest(&self, symbol: &str) -> Result<&Lot, LedgerError> {
        Ok(self.buffer(symbol)?.last()?)
    }

    pub fn lots(&self, symbol: &str) -> Result<impl Iterator<Item = &Lot> + '_, LedgerError> {
        Ok(self.buffer(symbol)?.iter())
    }

    /// Total shares of `symbol` across all open lots.
    pub fn open_position(&self, symbol: &str) -> Result<u64, LedgerError> {
        let total = self
            .buffer(symbol)?
            .iter()
            .try_fold(0u64, |total, lot| total.checked_add(lot.quantity().get()))
            .ok_or(BufferError::Overflow("adding"))?;
        Ok(total)
    }

    /// The most recent buy (Open) or sale (Settled) of `symbol`.
    pub fn last_transaction(&self, symbol: &str) -> Result<&Lot, LedgerError> {
        let key = Self::key(symbol);
        if !self.buffers.contains_key(&key) {
            return Err(LedgerError::UnknownSymbol(symbol.trim().to_string()));
        }
        Ok(self.last_transactions.get(&key).ok_or(BufferError::Empty)?)
    }

    pub fn realized_total(&self) -> Decimal {
        self.realized
    }

    fn buffer(&self, symbol: &str) -> Result<&LotBuffer, LedgerError> {
        self.buffers
            .get(&Self::key(symbol))
            .ok_or_else(|| LedgerError::UnknownSymbol(symbol.trim().to_string()))
    }

    fn key(symbol: &str) -> String {
        symbol.trim().to_uppercase()
    }
}
