use std::{
    io::{BufRead, Write},
    num::NonZeroU64,
    str::FromStr,
};

use tracing::debug;

use crate::{
    error::{BufferError, LedgerError},
    ledger::Ledger,
    lot::LotSide,
    market::Market,
};

/// How a session ended. Each variant maps to its own process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user declined to see the menu again.
    Completed,
    /// A purchase did not fit in the symbol's lot buffer.
    BuyOverflow,
    /// A sale was requested for a symbol with no open lots.
    SellEmpty,
    /// The last transaction was requested for a symbol with no open lots.
    ViewEmpty,
    /// The user picked quit from the menu, or input ran out.
    Quit,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Completed => 0,
            Outcome::BuyOverflow => 1,
            Outcome::SellEmpty => 2,
            Outcome::ViewEmpty => 3,
            Outcome::Quit => 4,
        }
    }
}

/// A menu choice.
///
/// Buy: purchase shares of a listed security at today's price.
/// Sell: sell shares out of the oldest lot of a security.
/// View: show the most recent transaction of a security still held.
/// Quit: leave the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Buy,
    Sell,
    View,
    Quit,
}

impl FromStr for Command {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "a" | "buy" => Ok(Command::Buy),
            "b" | "sell" => Ok(Command::Sell),
            "c" | "view" => Ok(Command::View),
            "d" | "quit" => Ok(Command::Quit),
            other => Err(LedgerError::UnknownCommand(other.to_string())),
        }
    }
}

/// Interactive driver: reads menu choices from `input`, applies them to the
/// ledger at the market's current prices and writes the transcript to
/// `output`.
pub struct Session<R, W> {
    input: R,
    output: W,
    market: Market,
    ledger: Ledger,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, market: Market, ledger: Ledger) -> Self {
        Session {
            input,
            output,
            market,
            ledger,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    /// Run menu rounds until the user stops or a terminal condition is hit.
    pub fn run(&mut self) -> Result<Outcome, LedgerError> {
        writeln!(self.output, "Welcome to Trade X")?;
        writeln!(self.output)?;

        loop {
            self.print_day()?;
            self.print_menu()?;
            let Some(choice) = self.prompt("Please make a decision (a,b,c,d): ")? else {
                return self.finish(Outcome::Quit);
            };
            writeln!(self.output)?;

            let command = match Command::from_str(&choice) {
                Ok(command) => command,
                Err(err) => {
                    debug!(%err, "leaving on unrecognised menu choice");
                    writeln!(self.output, "{err}")?;
                    Command::Quit
                }
            };
            debug!(?command, day = self.market.day(), "menu choice");
            let ended = match command {
                Command::Buy => self.buy()?,
                Command::Sell => self.sell()?,
                Command::View => self.view()?,
                Command::Quit => Some(Outcome::Quit),
            };
            if let Some(outcome) = ended {
                return self.finish(outcome);
            }

            let again = self.prompt("Would you like to see the menu again? (Y/N): ")?;
            writeln!(self.output)?;
            self.market.advance_day();
            match again {
                Some(answer) if answer.eq_ignore_ascii_case("y") => continue,
                _ => return self.finish(Outcome::Completed),
            }
        }
    }

    fn buy(&mut self) -> Result<Option<Outcome>, LedgerError> {
        self.print_listing()?;
        let Some(symbol) =
            self.prompt_symbol("Which stock would you like to purchase?\n(enter ticker symbol): ")?
        else {
            return Ok(Some(Outcome::Quit));
        };
        let Some(quantity) = self.prompt_quantity("Number of Shares: ")? else {
            return Ok(Some(Outcome::Quit));
        };
        writeln!(self.output)?;

        let price = self.market.quote(&symbol)?.price;
        match self.ledger.buy(&symbol, quantity, price, self.market.date()) {
            Ok(lot) => {
                writeln!(self.output, "Success!")?;
                writeln!(self.output, "{lot}")?;
                writeln!(self.output)?;
                Ok(None)
            }
            Err(LedgerError::Buffer(err @ BufferError::Full { .. })) => {
                writeln!(self.output, "{err}")?;
                Ok(Some(Outcome::BuyOverflow))
            }
            Err(err) => Err(err),
        }
    }

    fn sell(&mut self) -> Result<Option<Outcome>, LedgerError> {
        let Some(symbol) =
            self.prompt_symbol("Which stock would you like to sell?\n(enter ticker symbol): ")?
        else {
            return Ok(Some(Outcome::Quit));
        };

        let oldest = match self.ledger.oldest(&symbol) {
            Ok(lot) => lot.clone(),
            Err(LedgerError::Buffer(err @ BufferError::Empty)) => {
                writeln!(self.output, "{err}")?;
                return Ok(Some(Outcome::SellEmpty));
            }
            Err(err) => return Err(err),
        };

        writeln!(self.output)?;
        self.print_listing()?;
        writeln!(self.output, "Your Longest Held Transaction")?;
        writeln!(self.output, "-----------------------------")?;
        writeln!(self.output, "{oldest}")?;
        writeln!(self.output)?;

        let price = self.market.quote(&symbol)?.price;
        loop {
            let Some(quantity) = self.prompt_quantity("Sell shares: ")? else {
                return Ok(Some(Outcome::Quit));
            };
            match self.ledger.sell(&symbol, quantity, price) {
                Ok(sale) => {
                    writeln!(self.output, "Success!")?;
                    writeln!(self.output, "Capital Gain: ${:.2}", sale.gain)?;
                    writeln!(self.output)?;
                    return Ok(None);
                }
                Err(LedgerError::Buffer(BufferError::InsufficientShares { .. })) => {
                    writeln!(self.output)?;
                    writeln!(self.output, "You don't have enough shares.")?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn view(&mut self) -> Result<Option<Outcome>, LedgerError> {
        let Some(symbol) =
            self.prompt_symbol("Which stock would you like to review?\n(enter ticker symbol): ")?
        else {
            return Ok(Some(Outcome::Quit));
        };
        writeln!(self.output)?;

        let latest = match self.ledger.latest(&symbol) {
            Ok(lot) => lot.clone(),
            Err(LedgerError::Buffer(BufferError::Empty)) => {
                writeln!(self.output, "You hold no open lots of {symbol}.")?;
                return Ok(Some(Outcome::ViewEmpty));
            }
            Err(err) => return Err(err),
        };

        // A sale after the latest buy is the more recent of the two.
        let record = self.ledger.last_transaction(&symbol).unwrap_or(&latest);
        let verb = match record.side() {
            LotSide::Open => "bought",
            LotSide::Settled => "sold",
        };
        writeln!(self.output, "You {verb} {record}")?;
        Ok(None)
    }

    fn finish(&mut self, outcome: Outcome) -> Result<Outcome, LedgerError> {
        writeln!(self.output, "Exiting App")?;
        writeln!(
            self.output,
            "Total Capital Gain: ${:.2}",
            self.ledger.realized_total()
        )?;
        self.output.flush()?;
        Ok(outcome)
    }

    fn print_day(&mut self) -> Result<(), LedgerError> {
        writeln!(self.output, "DAY {} ({})", self.market.day(), self.market.date())?;
        writeln!(self.output)?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<(), LedgerError> {
        writeln!(self.output, "MENU OPTIONS")?;
        writeln!(self.output, "--------------------------------")?;
        writeln!(self.output, "a) Purchase Stock")?;
        writeln!(self.output, "b) Sell Stock")?;
        writeln!(self.output, "c) View last transaction")?;
        writeln!(self.output, "d) Quit")?;
        writeln!(self.output)?;
        Ok(())
    }

    fn print_listing(&mut self) -> Result<(), LedgerError> {
        writeln!(self.output, "CURRENT LISTING")?;
        writeln!(self.output, "--------------------------------")?;
        writeln!(self.output, "{:<8}{:>12}  Rate", "Symbol", "Price")?;
        for listing in self.market.listings() {
            writeln!(self.output, "{listing}")?;
        }
        writeln!(self.output)?;
        Ok(())
    }

    /// Ask until the answer names a listed security. `None` at end of input.
    fn prompt_symbol(&mut self, text: &str) -> Result<Option<String>, LedgerError> {
        loop {
            let Some(answer) = self.prompt(text)? else {
                return Ok(None);
            };
            match self.market.quote(&answer) {
                Ok(listing) => return Ok(Some(listing.symbol.clone())),
                Err(err) => writeln!(self.output, "{err}")?,
            }
        }
    }

    /// Ask until the answer is a positive whole number. `None` at end of input.
    fn prompt_quantity(&mut self, text: &str) -> Result<Option<NonZeroU64>, LedgerError> {
        loop {
            let Some(answer) = self.prompt(text)? else {
                return Ok(None);
            };
            match answer.parse::<NonZeroU64>() {
                Ok(quantity) => return Ok(Some(quantity)),
                Err(_) => writeln!(
                    self.output,
                    "Please enter a whole number of shares greater than zero."
                )?,
            }
        }
    }

    /// Write `text` and read the next non-blank line, trimmed.
    fn prompt(&mut self, text: &str) -> Result<Option<String>, LedgerError> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim();
            if !answer.is_empty() {
                return Ok(Some(answer.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::market::Listing;

    fn run(script: &str, capacity: usize) -> Result<(Outcome, String, Ledger), LedgerError> {
        let market = Market::new(
            Listing::defaults(),
            NaiveDate::from_ymd_opt(2018, 4, 29).expect("valid date"),
        );
        let ledger = Ledger::new(
            market.symbols(),
            NonZeroUsize::new(capacity).expect("non-zero capacity"),
        );
        let mut output = Vec::new();
        let mut session = Session::new(script.as_bytes(), &mut output, market, ledger);
        let outcome = session.run()?;
        let Session { ledger, .. } = session;
        Ok((outcome, String::from_utf8_lossy(&output).into_owned(), ledger))
    }

    #[test]
    fn test_parse_command() -> Result<(), LedgerError> {
        assert_eq!(Command::from_str("a")?, Command::Buy);
        assert_eq!(Command::from_str(" B ")?, Command::Sell);
        assert_eq!(Command::from_str("view")?, Command::View);
        assert_eq!(Command::from_str("D")?, Command::Quit);
        Command::from_str("z").expect_err("Successfully parsed an invalid command");
        Ok(())
    }

    #[test]
    fn test_buy_then_sell_next_day() -> Result<(), LedgerError> {
        // Buy 10 AMZN at 1500 on day 1, sell 4 at 1300 on day 2.
        let (outcome, transcript, ledger) = run("a\nAMZN\n10\ny\nb\nAMZN\n4\nn\n", 10)?;

        assert_eq!(outcome, Outcome::Completed);
        assert!(transcript.contains("10 share(s) of AMZN at $1500.00 each."));
        assert!(transcript.contains("DAY 2 (2018-04-30)"));
        assert!(transcript.contains("Capital Gain: $-800.00"));
        assert!(transcript.contains("Total Capital Gain: $-800.00"));
        assert_eq!(ledger.open_position("AMZN")?, 6);
        assert_eq!(ledger.oldest("AMZN")?.unit_cost(), dec!(1500));

        Ok(())
    }

    #[test]
    fn test_sell_reprompts_on_too_many_shares() -> Result<(), LedgerError> {
        let (outcome, transcript, ledger) = run("a\nFB\n3\ny\nb\nfb\n5\n0\n3\ny\nd\n", 10)?;

        assert!(transcript.contains("You don't have enough shares."));
        assert!(transcript.contains("Please enter a whole number of shares greater than zero."));
        assert!(transcript.contains("Capital Gain: $7500.00"));
        assert_eq!(outcome, Outcome::Quit);
        assert_eq!(ledger.open_position("FB")?, 0);

        Ok(())
    }

    #[test]
    fn test_unknown_symbol_is_reprompted() -> Result<(), LedgerError> {
        let (_, transcript, ledger) = run("a\nGOOG\nAAPL\n2\nn\n", 10)?;

        assert!(transcript.contains("Your entry is not listed: GOOG"));
        assert_eq!(ledger.open_position("AAPL")?, 2);

        Ok(())
    }

    #[test]
    fn test_terminal_outcomes() -> Result<(), LedgerError> {
        let (outcome, transcript, _) = run("a\nAMZN\n1\ny\na\nAMZN\n1\n", 1)?;
        assert_eq!(outcome, Outcome::BuyOverflow);
        assert!(transcript.contains("This cart is full"));

        let (outcome, transcript, _) = run("b\nAMZN\n", 10)?;
        assert_eq!(outcome, Outcome::SellEmpty);
        assert!(transcript.contains("This cart is empty."));

        let (outcome, transcript, _) = run("c\nAMZN\n", 10)?;
        assert_eq!(outcome, Outcome::ViewEmpty);
        assert!(transcript.contains("You hold no open lots of AMZN."));

        let (outcome, transcript, _) = run("x\n", 10)?;
        assert_eq!(outcome, Outcome::Quit);
        assert!(transcript.contains("Unknown menu option 'x'. Options: a, b, c, d"));

        let (outcome, _, _) = run("", 10)?;
        assert_eq!(outcome, Outcome::Quit);

        Ok(())
    }

    #[test]
    fn test_view_last_reports_buy_and_sale() -> Result<(), LedgerError> {
        let (_, transcript, _) = run("a\nAAPL\n5\ny\nc\nAAPL\ny\nb\nAAPL\n2\ny\nc\naapl\nn\n", 10)?;

        assert!(transcript.contains("You bought 5 share(s) of AAPL at $180.00 each."));
        // Sold on day 3 at 180 + 2 * 320.50.
        assert!(transcript.contains("You sold 2 share(s) of AAPL at $821.00 each."));

        Ok(())
    }

    #[test]
    fn test_view_after_selling_everything_ends_session() -> Result<(), LedgerError> {
        let (outcome, transcript, ledger) = run("a\nAMZN\n5\ny\nb\nAMZN\n5\ny\nc\nAMZN\nd\n", 10)?;

        assert_eq!(outcome, Outcome::ViewEmpty);
        assert!(transcript.contains("You hold no open lots of AMZN."));
        assert!(!transcript.contains("You sold"));
        assert_eq!(ledger.open_position("AMZN")?, 0);

        Ok(())
    }

    #[test]
    fn test_view_of_other_symbol_is_independent() -> Result<(), LedgerError> {
        let (outcome, transcript, _) = run("a\nFB\n2\ny\nc\nAAPL\n", 10)?;

        assert_eq!(outcome, Outcome::ViewEmpty);
        assert!(!transcript.contains("You bought"));

        Ok(())
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            Outcome::Completed,
            Outcome::BuyOverflow,
            Outcome::SellEmpty,
            Outcome::ViewEmpty,
            Outcome::Quit,
        ]
        .map(Outcome::code);
        assert_eq!(codes, [0, 1, 2, 3, 4]);
    }
}
