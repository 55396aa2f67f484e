use std::{
    collections::HashSet,
    io,
    num::NonZeroUsize,
    process::ExitCode,
};

use chrono::{Local, NaiveDate};
use clap::Parser;
use fifogain::{Ledger, LedgerError, Listing, Market, Session};
use tracing_subscriber::EnvFilter;

const DEFAULT_CAPACITY: usize = 10;

/// Exit code for I/O and other unexpected failures, kept apart from the
/// session outcomes 0 to 4.
const ERROR_EXIT_CODE: u8 = 5;

/// Represents the command line arguments
///
/// `capacity`: maximum number of open lots held per security.
/// `listings`: securities available for trade. Defaults to AMZN, FB and AAPL.
/// `start_date`: calendar date of day 1. Defaults to today.
#[derive(Parser, Debug)]
#[clap(name = "fifogain", about = "Buy and sell lots and report FIFO capital gains")]
pub struct CliOpts {
    #[clap(long, env = "FIFOGAIN_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    #[clap(
        long = "listing",
        value_name = "SYMBOL:PRICE:RATE[:PRICE_DRIFT:RATE_DRIFT]"
    )]
    listings: Vec<Listing>,

    #[clap(long, value_name = "YYYY-MM-DD")]
    start_date: Option<NaiveDate>,

    /// Log every buffer operation to stderr.
    #[clap(short, long)]
    verbose: bool,
}

impl CliOpts {
    /// Build the market and an empty ledger from the command line.
    fn build(self) -> Result<(Market, Ledger), LedgerError> {
        let capacity = NonZeroUsize::new(self.capacity).ok_or(LedgerError::ZeroCapacity)?;
        let listings = if self.listings.is_empty() {
            Listing::defaults()
        } else {
            self.listings
        };
        {
            let mut seen = HashSet::new();
            for listing in &listings {
                if !seen.insert(listing.symbol.as_str()) {
                    return Err(LedgerError::DuplicateSymbol(listing.symbol.clone()));
                }
            }
        }
        let start_date = self
            .start_date
            .unwrap_or_else(|| Local::now().date_naive());

        let market = Market::new(listings, start_date);
        let ledger = Ledger::new(market.symbols(), capacity);
        Ok((market, ledger))
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "fifogain=debug" } else { "fifogain=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Logs go to stderr so the transcript on stdout stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(opts: CliOpts) -> Result<u8, LedgerError> {
    let (market, ledger) = opts.build()?;
    let stdin = io::stdin();
    let mut session = Session::new(stdin.lock(), io::stdout(), market, ledger);
    let outcome = session.run()?;
    tracing::info!(?outcome, realized = %session.ledger().realized_total(), "session ended");
    Ok(outcome.code())
}

fn main() -> ExitCode {
    let opts = CliOpts::parse();
    init_tracing(opts.verbose);

    match run(opts) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(ERROR_EXIT_CODE)
        }
    }
}
