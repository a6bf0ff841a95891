//! Plain-text report for the terminal.

use fundamental_analysis::{StockReport, SubScore};
use std::fmt::Write;

fn opt(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{v:.2}{suffix}"),
        None => "n/a".to_string(),
    }
}

fn money(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1e12 => format!("{:.2}T", v / 1e12),
        Some(v) if v.abs() >= 1e9 => format!("{:.2}B", v / 1e9),
        Some(v) if v.abs() >= 1e6 => format!("{:.2}M", v / 1e6),
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}

fn score(s: &SubScore) -> String {
    if s.is_computable() {
        format!("{:>5.1} / 10", s.value)
    } else {
        "  n/a".to_string()
    }
}

pub fn render_text(report: &StockReport) -> String {
    let f = &report.fundamentals;
    let h = &report.history;
    let card = &report.scorecard;
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", report.narrative.headline);
    let _ = writeln!(
        out,
        "{} | {} | {}",
        f.sector.as_deref().unwrap_or("Unknown sector"),
        f.industry.as_deref().unwrap_or("Unknown industry"),
        f.country.as_deref().unwrap_or("Unknown country")
    );
    let _ = writeln!(
        out,
        "Price {}  Target {}  Market cap {}  Benchmark {}",
        opt(f.current_price, ""),
        opt(f.target_price, ""),
        money(f.market_cap),
        card.benchmark
    );

    let _ = writeln!(out, "\nScores");
    let _ = writeln!(out, "  Quality      {}", score(&card.quality));
    let _ = writeln!(out, "  Health       {}", score(&card.health));
    let _ = writeln!(out, "  Valuation    {}", score(&card.valuation));
    let _ = writeln!(out, "  Dividends    {}", score(&card.dividends));
    let _ = writeln!(
        out,
        "  Geopolitical {:>5.1} / 10 (penalty {:.1})",
        card.geopolitical.score, card.geopolitical.penalty
    );
    let _ = writeln!(out, "  Composite    {:>5.1} / 10 ({})", card.composite, card.verdict.label());

    let _ = writeln!(out, "\nKey metrics");
    let _ = writeln!(
        out,
        "  ROE {}  ROIC {}  Op margin {}  Net margin {}",
        opt(f.roe, "%"),
        opt(f.roic, "%"),
        opt(f.operating_margin, "%"),
        opt(f.net_margin, "%")
    );
    let _ = writeln!(
        out,
        "  P/E {}  Fwd P/E {}  P/FCF {}  P/B {}  PEG {}",
        opt(f.trailing_pe, ""),
        opt(f.forward_pe, ""),
        opt(f.price_to_fcf, ""),
        opt(f.price_to_book, ""),
        opt(card.peg, "")
    );
    let _ = writeln!(
        out,
        "  Net debt/EBITDA {}  Interest cover {}  Current ratio {}  FCF {}",
        opt(f.net_debt_to_ebitda, "x"),
        opt(f.interest_coverage, "x"),
        opt(f.current_ratio, ""),
        money(f.free_cash_flow)
    );
    let _ = writeln!(
        out,
        "  Yield {}  Payout {}  Payout/FCF {}  Net buybacks {}",
        opt(f.dividend_yield, "%"),
        opt(f.payout_ratio, "%"),
        opt(f.payout_on_fcf, "%"),
        opt(f.net_buyback_pct, "%")
    );
    let growth = |g: Option<fundamental_analysis::GrowthRate>| match g {
        Some(g) => format!("{:.2}% ({})", g.value, g.window.label()),
        None => "n/a".to_string(),
    };
    let _ = writeln!(out, "  EPS CAGR {}  FCF CAGR {}", growth(h.eps_cagr), growth(h.fcf_cagr));

    if h.available {
        let _ = writeln!(out, "\nHistory");
        let _ = writeln!(
            out,
            "  Historical P/E {}  Historical yield {}  ATH {} ({} from high)",
            opt(h.historical_pe, ""),
            opt(h.historical_yield, "%"),
            opt(h.all_time_high, ""),
            opt(h.ath_distance_pct, "%")
        );
        let _ = writeln!(
            out,
            "  SMA50 {}  SMA200 {}  RSI14 {}  Trend {:?}",
            opt(h.technical.latest_sma_50(), ""),
            opt(h.technical.latest_sma_200(), ""),
            opt(h.technical.latest_rsi(), ""),
            h.technical.trend()
        );
    }

    let m = &card.margins_of_safety;
    let _ = writeln!(
        out,
        "\nMargin of safety: target {}  hist P/E {}  hist yield {}",
        opt(m.vs_analyst_target, "%"),
        opt(m.vs_historical_pe, "%"),
        opt(m.vs_historical_yield, "%")
    );

    if !report.red_flags.is_empty() {
        let _ = writeln!(out, "\nRed flags");
        for flag in &report.red_flags {
            let _ = writeln!(out, "  [{:?}] {}", flag.severity, flag.message);
        }
    }

    let _ = writeln!(out, "\nSummary ({:?})", report.narrative.profile);
    for section in &report.narrative.sections {
        let _ = writeln!(out, "  {}: {}", section.title, section.text);
    }

    if !report.narrative.caveats.is_empty() {
        let _ = writeln!(out, "\nCaveats");
        for caveat in &report.narrative.caveats {
            let _ = writeln!(out, "  - {caveat}");
        }
    }

    out
}
