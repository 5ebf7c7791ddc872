//! Odds and payout preview for a market's pool state.
//!
//! Usage:
//!   odds-check --yes 30 --no 70      # Preview from explicit pool totals
//!   odds-check --app-id 1042         # Preview from live ledger state

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use common::models::BetSide;
use common::odds::{payout_multiplier, pool_odds, potential_payout};
use common::{CachedLedgerReader, Config, HttpLedgerClient, LedgerReader, MarketStatus};

#[derive(Parser, Debug)]
#[command(name = "odds-check")]
#[command(about = "Preview pari-mutuel odds and payout multipliers")]
struct Args {
    /// YES pool total
    #[arg(long)]
    yes: Option<Decimal>,

    /// NO pool total
    #[arg(long)]
    no: Option<Decimal>,

    /// Fetch pool totals from the ledger for this app id
    #[arg(long)]
    app_id: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder().with_max_level(Level::WARN).init();

    let args = Args::parse();

    let (yes_total, no_total) = match (args.app_id, args.yes, args.no) {
        (Some(app_id), None, None) => fetch_pool(app_id).await?,
        (None, Some(yes), Some(no)) => {
            if yes.is_sign_negative() || no.is_sign_negative() {
                bail!("Pool totals must be non-negative");
            }
            (yes, no)
        }
        _ => bail!("Provide either --app-id, or both --yes and --no"),
    };

    print_preview(yes_total, no_total);
    Ok(())
}

async fn fetch_pool(app_id: i64) -> Result<(Decimal, Decimal)> {
    if app_id <= 0 {
        bail!("App id must be a positive integer");
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let client = HttpLedgerClient::new(&config)?;
    let reader = CachedLedgerReader::new(client, Duration::from_secs(30));

    let record = reader
        .fetch_market_state(app_id)
        .await
        .context("Ledger fetch failed")?;

    match record {
        Some(record) => {
            if let Some(status) = MarketStatus::from_ledger_code(record.status_code) {
                println!("Ledger status:  {}", status.as_str());
            }
            if let Some(outcome_ref) = &record.outcome_ref {
                println!("Outcome ref:    {}", outcome_ref);
            }
            Ok((record.yes_total, record.no_total))
        }
        None => bail!("App {} not found on ledger", app_id),
    }
}

fn print_preview(yes_total: Decimal, no_total: Decimal) {
    let odds = pool_odds(yes_total, no_total);
    let yes_mult = payout_multiplier(yes_total, no_total, BetSide::Yes);
    let no_mult = payout_multiplier(yes_total, no_total, BetSide::No);

    println!("Pool:           {} YES / {} NO", yes_total, no_total);
    println!("Odds:           {}% YES / {}% NO", odds.yes, odds.no);
    println!(
        "Multipliers:    {}x YES / {}x NO",
        yes_mult.round_dp(2),
        no_mult.round_dp(2)
    );

    println!();
    println!("Payout preview for sample stakes:");
    println!("  {:>10} {:>14} {:>14}", "stake", "YES wins", "NO wins");
    for stake in [dec!(1), dec!(10), dec!(100)] {
        let yes_payout = potential_payout(stake, yes_total, no_total, BetSide::Yes);
        let no_payout = potential_payout(stake, yes_total, no_total, BetSide::No);
        println!(
            "  {:>10} {:>14} {:>14}",
            stake,
            yes_payout.round_dp(2),
            no_payout.round_dp(2)
        );
    }
}
