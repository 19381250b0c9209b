//! Report Benchmarks — Per-Round Publishing Path
//!
//! Benchmarks the work done once per resolved round before any upload:
//! report assembly, canonical serialization and the two renders.
//!
//! Run with: cargo bench --bench report_bench

use alloy::primitives::{Address, B256, U256};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use bethouse_oracle::adapters::render::StandardRenderer;
use bethouse_oracle::domain::participants::tokens;
use bethouse_oracle::domain::price::scale_to_feed;
use bethouse_oracle::domain::report::{ReportContext, RoundReport, SimulatedPrices};
use bethouse_oracle::domain::round::{Bet, BetTotals, Round, Side};
use bethouse_oracle::ports::renderer::ArtifactRenderer;

/// A full round: 10 YES and 10 NO bets, price up.
fn fixture() -> (Round, ReportContext, Vec<Bet>) {
    let bets: Vec<Bet> = (1..=20u8)
        .map(|i| {
            let side = if i <= 10 { Side::Yes } else { Side::No };
            Bet::confirmed(Address::with_last_byte(i), side, tokens(10), 100, B256::with_last_byte(i))
        })
        .collect();
    let totals = BetTotals::of(&bets);

    let round = Round {
        id: 42,
        market_id: B256::repeat_byte(1),
        start_time: 1_700_000_000,
        end_time: 1_700_000_300,
        price_start: scale_to_feed(50_000, 8),
        price_end: scale_to_feed(50_500, 8),
        total_yes_net: totals.yes_net,
        total_no_net: totals.no_net,
        fee_accrued: totals.fees,
        active: false,
        resolved: true,
        outcome_yes: true,
        refund_mode: false,
    };
    let context = ReportContext {
        market_id: round.market_id,
        feed_address: Address::repeat_byte(2),
        feed_decimals: 8,
        oracle_address: Address::repeat_byte(3),
        bet_house_address: Address::repeat_byte(4),
        collateral_address: Address::repeat_byte(5),
        storage_address: Address::repeat_byte(6),
        round_seconds: 300,
        bet_window_seconds: 90,
    };
    (round, context, bets)
}

fn report() -> RoundReport {
    let (round, context, bets) = fixture();
    let prices = SimulatedPrices { start_usd: 50_000, end_usd: 50_500 };
    RoundReport::assemble(&round, &context, prices, &bets, 1_700_000_305)
}

/// Benchmark report assembly from a resolved round.
fn bench_assemble(c: &mut Criterion) {
    let (round, context, bets) = fixture();
    let prices = SimulatedPrices { start_usd: 50_000, end_usd: 50_500 };

    c.bench_function("report_assemble_20_bets", |b| {
        b.iter(|| {
            let _report = RoundReport::assemble(
                black_box(&round),
                &context,
                prices,
                black_box(&bets),
                1_700_000_305,
            );
        });
    });
}

/// Benchmark canonical JSON encoding.
fn bench_canonical_bytes(c: &mut Criterion) {
    let report = report();

    c.bench_function("report_canonical_bytes", |b| {
        b.iter(|| {
            let _bytes = black_box(&report).to_canonical_bytes();
        });
    });
}

/// Benchmark receipt and chart rendering.
fn bench_renders(c: &mut Criterion) {
    let report = report();
    let renderer = StandardRenderer;

    c.bench_function("render_receipt", |b| {
        b.iter(|| {
            let _receipt = renderer.render_receipt(black_box(&report));
        });
    });

    c.bench_function("render_chart", |b| {
        b.iter(|| {
            let _chart = renderer.render_chart(black_box(&report));
        });
    });
}

criterion_group!(benches, bench_assemble, bench_canonical_bytes, bench_renders);
criterion_main!(benches);
