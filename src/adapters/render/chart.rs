//! Two-point SVG price chart.
//!
//! Start and end feed prices on a fixed 800x400 canvas. The y-range is
//! padded around the two prices; a flat round gets a symmetric range so
//! the line sits in the middle.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::report::RoundReport;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

/// y-axis range: 10% of the move on each side, or 1% of the price when flat.
fn y_range(start: f64, end: f64) -> (f64, f64) {
    let (lo, hi) = (start.min(end), start.max(end));
    let pad = if hi > lo {
        (hi - lo) * 0.1
    } else {
        (hi.abs() * 0.01).max(1.0)
    };
    (lo - pad, hi + pad)
}

fn y_of(value: f64, (lo, hi): (f64, f64)) -> f64 {
    let plot = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    MARGIN_TOP + plot * (hi - value) / (hi - lo)
}

fn price(value: Option<Decimal>, which: &str) -> Result<(Decimal, f64)> {
    let exact = value.with_context(|| format!("{which} feed price out of range"))?;
    let approx = exact
        .to_f64()
        .with_context(|| format!("{which} feed price not plottable"))?;
    Ok((exact, approx))
}

/// Render the chart for `report` as SVG bytes.
pub fn render(report: &RoundReport) -> Result<Vec<u8>> {
    let (start_exact, start) = price(report.feed_price_start(), "start")?;
    let (end_exact, end) = price(report.feed_price_end(), "end")?;

    let range = y_range(start, end);
    let x0 = MARGIN_LEFT + 60.0;
    let x1 = WIDTH - MARGIN_RIGHT - 60.0;
    let (y0, y1) = (y_of(start, range), y_of(end, range));
    let axis_bottom = HEIGHT - MARGIN_BOTTOM;

    let mut svg = String::with_capacity(2_048);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="28" text-anchor="middle" font-family="sans-serif" font-size="18">Round {} - start / end price</text>"#,
        WIDTH / 2.0,
        report.round_id
    );
    let _ = writeln!(
        svg,
        r#"  <line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{axis_bottom}" stroke="black"/>"#
    );
    let _ = writeln!(
        svg,
        r#"  <line x1="{MARGIN_LEFT}" y1="{axis_bottom}" x2="{:.1}" y2="{axis_bottom}" stroke="black"/>"#,
        WIDTH - MARGIN_RIGHT
    );
    for (label, value) in [("max", range.1), ("min", range.0)] {
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="end" font-family="sans-serif" font-size="11" data-bound="{label}">{value:.2}</text>"#,
            MARGIN_LEFT - 6.0,
            y_of(value, range) + 4.0
        );
    }
    let _ = writeln!(
        svg,
        r##"  <polyline points="{x0:.1},{y0:.1} {x1:.1},{y1:.1}" fill="none" stroke="#1f77b4" stroke-width="3"/>"##
    );
    for (x, y, label, exact) in [(x0, y0, "Start", start_exact), (x1, y1, "End", end_exact)] {
        let _ = writeln!(svg, r##"  <circle cx="{x:.1}" cy="{y:.1}" r="5" fill="#1f77b4"/>"##);
        let _ = writeln!(
            svg,
            r#"  <text x="{x:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="12">{exact} USD</text>"#,
            y - 12.0
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{x:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="12">{label}</text>"#,
            axis_bottom + 20.0
        );
    }
    let _ = writeln!(svg, "</svg>");

    Ok(svg.into_bytes())
}
