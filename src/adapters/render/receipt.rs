//! Plain-text round receipt.
//!
//! Sections mirror the report: identity, timing, prices, outcome,
//! totals and the bet list. Timestamps are rendered from ledger time
//! in UTC so the output never depends on the host's timezone.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::DateTime;

use crate::domain::report::{RoundReport, format_token_amount};

const RULE: &str = "------------------------------------------------------------";

fn utc(ts: u64) -> Result<String> {
    let secs = i64::try_from(ts).context("timestamp out of range")?;
    let dt = DateTime::from_timestamp(secs, 0).context("timestamp out of range")?;
    Ok(dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn outcome_line(report: &RoundReport) -> &'static str {
    if report.refund_mode {
        "REFUND: end price equals start price, stakes are returned."
    } else if report.outcome_yes {
        "Winners: YES side (end price > start price)"
    } else {
        "Winners: NO side (end price < start price)"
    }
}

/// Render the receipt document for `report`.
pub fn render(report: &RoundReport) -> Result<Vec<u8>> {
    let mut out = String::with_capacity(2_048);

    // Writing into a String cannot fail; `writeln!` results are discarded.
    let _ = writeln!(out, "BetHouse - Round Receipt");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Round:        {}", report.round_id);
    let _ = writeln!(out, "Market:       {}", report.market_id);
    let _ = writeln!(out, "Oracle:       {}", report.oracle_address);
    let _ = writeln!(out, "BetHouse:     {}", report.bet_house_address);
    let _ = writeln!(out, "Collateral:   {}", report.collateral_address);
    let _ = writeln!(out, "Storage:      {}", report.storage_address);
    let _ = writeln!(out, "Feed:         {} ({} decimals)", report.feed_address, report.feed_decimals);
    let _ = writeln!(out);

    let _ = writeln!(out, "Timing");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Start:        {}", utc(report.start_time)?);
    let _ = writeln!(out, "End:          {}", utc(report.end_time)?);
    let _ = writeln!(out, "Resolved:     {}", utc(report.resolved_at)?);
    let _ = writeln!(
        out,
        "Round length: {}s (betting window {}s)",
        report.round_seconds, report.bet_window_seconds
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Prices");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Start (raw):  {}", report.price_start_feed_raw);
    let _ = writeln!(out, "End (raw):    {}", report.price_end_feed_raw);
    let _ = writeln!(out, "Start (sim):  {} USD", report.price_start_usd_sim);
    let _ = writeln!(out, "End (sim):    {} USD", report.price_end_usd_sim);
    let _ = writeln!(out);

    let _ = writeln!(out, "Outcome: {}", report.outcome_label());
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "{}", outcome_line(report));
    let _ = writeln!(out, "Total YES net: {}", format_token_amount(report.totals.total_yes_net));
    let _ = writeln!(out, "Total NO net:  {}", format_token_amount(report.totals.total_no_net));
    let _ = writeln!(out, "Fees accrued:  {}", format_token_amount(report.totals.fee_accrued));
    let _ = writeln!(out);

    let _ = writeln!(out, "Bets ({}, {} winning)", report.bets.len(), report.winner_count());
    let _ = writeln!(out, "{RULE}");
    for bet in &report.bets {
        let _ = writeln!(
            out,
            "{} {:<3} gross {} net {}{}",
            bet.address,
            bet.side.to_string(),
            format_token_amount(bet.gross),
            format_token_amount(bet.net),
            if bet.winner { "  WINNER" } else { "" }
        );
        let _ = writeln!(out, "    tx {}", bet.tx_hash);
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "This receipt is derived from the round report. The ledger remains the source of truth."
    );

    Ok(out.into_bytes())
}
