//! Performance scoring and report formatting.
//!
//! Scoring thresholds and the verdict rule are fixed heuristics carried as
//! named constants; they encode no published methodology.

use std::collections::BTreeMap;

use crate::stock::client::{Fundamentals, Quote};

pub const BASE_SCORE: f64 = 50.0;
pub const POSITIVE_CHANGE_BONUS: f64 = 10.0;
pub const NEGATIVE_CHANGE_PENALTY: f64 = 5.0;
pub const LOW_PE_BONUS: f64 = 10.0;
pub const HIGH_PE_PENALTY: f64 = 5.0;
pub const HIGH_YIELD_BONUS: f64 = 5.0;
pub const MODERATE_YIELD_BONUS: f64 = 2.0;
pub const MEGA_CAP_BONUS: f64 = 10.0;

pub const LOW_PE_THRESHOLD: f64 = 15.0;
pub const HIGH_PE_THRESHOLD: f64 = 30.0;
pub const HIGH_YIELD_THRESHOLD: f64 = 3.0;
pub const MODERATE_YIELD_THRESHOLD: f64 = 1.0;
pub const MEGA_CAP_THRESHOLD: u64 = 100_000_000_000;

/// Inputs to the performance score, already in display units
/// (`dividend_yield` is a percentage).
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs {
    pub percent_change: f64,
    pub pe_ratio: f64,
    pub dividend_yield: f64,
    pub market_cap: u64,
}

/// 0-100 heuristic combining momentum, valuation, yield, and scale.
pub fn performance_score(m: ScoreInputs) -> f64 {
    let mut score = BASE_SCORE;

    score += if m.percent_change > 0.0 {
        POSITIVE_CHANGE_BONUS
    } else {
        -NEGATIVE_CHANGE_PENALTY
    };

    if m.pe_ratio < LOW_PE_THRESHOLD {
        score += LOW_PE_BONUS;
    } else if m.pe_ratio > HIGH_PE_THRESHOLD {
        score -= HIGH_PE_PENALTY;
    }

    if m.dividend_yield > HIGH_YIELD_THRESHOLD {
        score += HIGH_YIELD_BONUS;
    } else if m.dividend_yield > MODERATE_YIELD_THRESHOLD {
        score += MODERATE_YIELD_BONUS;
    }

    if m.market_cap > MEGA_CAP_THRESHOLD {
        score += MEGA_CAP_BONUS;
    }

    score.clamp(0.0, 100.0)
}

/// One fully fetched symbol for the market overview.
#[derive(Debug, Clone)]
pub struct MarketEntry {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub price_change: f64,
    pub percent_change: f64,
    pub industry: String,
    pub score: f64,
}

/// Render the market overview: top 5 by score, then per-sector averages.
pub fn format_market_overview(mut entries: Vec<MarketEntry>) -> String {
    entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = String::from("Stock Market Overview:\n\n");
    out.push_str("Top 5 Performing Stocks:\n");
    for (i, e) in entries.iter().take(5).enumerate() {
        let glyph = if e.price_change >= 0.0 { '↑' } else { '↓' };
        out.push_str(&format!(
            "{}. {} ({})\n   Price: ${:.2} ({} {:.2}, {}%)\n   Performance Score: {:.2}/100\n   Sector: {}\n\n",
            i + 1,
            e.company_name,
            e.symbol,
            e.current_price,
            glyph,
            e.price_change.abs(),
            e.percent_change,
            e.score,
            e.industry,
        ));
    }

    let mut sectors: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for e in &entries {
        let sector = if e.industry.is_empty() {
            "Unknown"
        } else {
            &e.industry
        };
        sectors.entry(sector).or_default().push(e.score);
    }

    out.push_str("Sector Performance Summary:\n");
    for (sector, scores) in &sectors {
        let avg = scores.iter().sum::<f64>() / scores.len() as f64;
        out.push_str(&format!("{sector}: Average Performance Score {avg:.2}/100\n"));
    }

    out.push_str(
        "\nNote: Performance scores are based on price change, valuation, dividend yield, and market capitalization.",
    );
    out
}

/// Render the single-symbol quote report, fundamentals appended when known.
pub fn format_quote_report(quote: &Quote, fundamentals: Option<&Fundamentals>, symbol: &str) -> String {
    let change = quote.change_f64();
    let glyph = if change >= 0.0 { '↑' } else { '↓' };

    let mut out = format!(
        "Stock Information for {}\n\
         Last Trading Day: {}\n\n\
         Current Price: ${:.2}\n\
         Change: {} ${:.2} ({})\n\
         Trading Volume: {}\n\
         Day Range: ${:.2} - ${:.2}\n\
         Opening Price: ${:.2}\n\
         Previous Close: ${:.2}",
        symbol,
        quote.latest_trading_day,
        quote.price_f64(),
        glyph,
        change.abs(),
        quote.change_percent,
        format_volume(quote.volume_u64()),
        quote.high.parse::<f64>().unwrap_or(0.0),
        quote.low.parse::<f64>().unwrap_or(0.0),
        quote.open.parse::<f64>().unwrap_or(0.0),
        quote.previous_close.parse::<f64>().unwrap_or(0.0),
    );

    if let Some(f) = fundamentals {
        out.push_str(&format!(
            "\n\nCompany Details:\n\
             Company Name: {}\n\
             Industry: {}\n\
             Market Cap: ${:.2} million\n\
             P/E Ratio: {}\n\
             Dividend Yield: {:.2}%\n\
             Earnings Per Share (EPS): ${}\n\
             Beta: {}\n\
             50-Day Moving Average: ${}\n\
             200-Day Moving Average: ${}",
            f.company_name,
            f.industry,
            f.market_cap_millions(),
            f.pe_ratio,
            f.dividend_yield_pct(),
            f.eps,
            f.beta,
            f.fifty_day_moving_average,
            f.two_hundred_day_moving_average,
        ));
        out.push_str(&format_assessment(quote, f));
    }

    out
}

/// Qualitative assessment from fixed thresholds on cap, P/E, momentum,
/// yield, and beta, closed with an overall verdict.
fn format_assessment(quote: &Quote, f: &Fundamentals) -> String {
    let cap_millions = f.market_cap_millions();
    let pe = f.pe_ratio_f64();
    let yield_pct = f.dividend_yield_pct();
    let beta = f.beta_f64();
    let change = quote.change_f64();
    let percent = quote.percent_change_f64();

    let mut out = String::from("\n\nInvestment Potential Assessment:\n");

    if cap_millions > 10_000.0 {
        out.push_str(&format!(
            "• Market Leadership: Strong (Large Cap, {cap_millions:.2} million market cap)\n"
        ));
    } else if cap_millions > 2_000.0 {
        out.push_str(&format!(
            "• Market Position: Solid (Mid Cap, {cap_millions:.2} million market cap)\n"
        ));
    }

    if pe < 15.0 {
        out.push_str(&format!("• Valuation: Potentially Undervalued (P/E Ratio: {pe:.2})\n"));
    } else if pe > 25.0 {
        out.push_str(&format!("• Valuation: Trading at a premium (P/E Ratio: {pe:.2})\n"));
    } else {
        out.push_str(&format!("• Valuation: Fairly priced (P/E Ratio: {pe:.2})\n"));
    }

    if change > 0.0 {
        out.push_str(&format!("• Recent Performance: Positive ({percent}% change)\n"));
    } else {
        out.push_str(&format!("• Recent Performance: Negative ({percent}% change)\n"));
    }

    if yield_pct > 3.0 {
        out.push_str(&format!("• Income Potential: High dividend yield ({yield_pct:.2}%)\n"));
    } else if yield_pct > 1.0 {
        out.push_str(&format!("• Income Potential: Moderate dividend ({yield_pct:.2}%)\n"));
    }

    if beta < 0.5 {
        out.push_str(&format!("• Market Risk: Low volatility (Beta: {beta:.2})\n"));
    } else if beta < 1.0 {
        out.push_str(&format!("• Market Risk: Moderate volatility (Beta: {beta:.2})\n"));
    } else {
        out.push_str(&format!("• Market Risk: High volatility (Beta: {beta:.2})\n"));
    }

    let verdict = if pe < 20.0 && cap_millions > 2_000.0 && change > 0.0 && yield_pct > 1.0 {
        "Highly Promising"
    } else if pe < 25.0 && cap_millions > 1_000.0 && yield_pct > 0.5 {
        "Moderately Promising"
    } else {
        "Requires Careful Consideration"
    };
    out.push_str(&format!("\nOverall Promise: {verdict}"));

    out
}

/// Thousands-separated volume, matching locale-formatted display.
fn format_volume(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ScoreInputs {
        ScoreInputs {
            percent_change: 1.0,
            pe_ratio: 20.0,
            dividend_yield: 0.0,
            market_cap: 1_000_000,
        }
    }

    #[test]
    fn test_base_score_with_positive_change() {
        assert_eq!(performance_score(inputs()), 60.0);
    }

    #[test]
    fn test_negative_change_penalty() {
        let m = ScoreInputs {
            percent_change: -2.0,
            ..inputs()
        };
        assert_eq!(performance_score(m), 45.0);
    }

    #[test]
    fn test_maximal_score_is_clamped() {
        let m = ScoreInputs {
            percent_change: 5.0,
            pe_ratio: 10.0,
            dividend_yield: 4.0,
            market_cap: 200_000_000_000,
        };
        // 50 + 10 + 10 + 5 + 10 = 85, under the clamp.
        assert_eq!(performance_score(m), 85.0);
    }

    #[test]
    fn test_clamp_bounds() {
        let m = ScoreInputs {
            percent_change: -1.0,
            pe_ratio: 50.0,
            dividend_yield: 0.0,
            market_cap: 0,
        };
        let score = performance_score(m);
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_volume_formatting() {
        assert_eq!(format_volume(45034212), "45,034,212");
        assert_eq!(format_volume(999), "999");
        assert_eq!(format_volume(1000), "1,000");
    }

    fn entry(symbol: &str, industry: &str, score: f64) -> MarketEntry {
        MarketEntry {
            symbol: symbol.to_string(),
            company_name: format!("{symbol} Co"),
            current_price: 100.0,
            price_change: 1.0,
            percent_change: 1.0,
            industry: industry.to_string(),
            score,
        }
    }

    #[test]
    fn test_overview_sorts_by_score() {
        let out = format_market_overview(vec![
            entry("LOW", "Tech", 40.0),
            entry("HIGH", "Tech", 90.0),
        ]);
        let high_pos = out.find("HIGH").unwrap();
        let low_pos = out.find("LOW").unwrap();
        assert!(high_pos < low_pos);
    }

    #[test]
    fn test_overview_sector_averages() {
        let out = format_market_overview(vec![
            entry("A", "Tech", 60.0),
            entry("B", "Tech", 80.0),
        ]);
        assert!(out.contains("Tech: Average Performance Score 70.00/100"));
    }

    #[test]
    fn test_quote_report_without_fundamentals() {
        let quote = Quote {
            symbol: "AAPL".into(),
            open: "230.00".into(),
            high: "234.50".into(),
            low: "229.10".into(),
            price: "233.22".into(),
            volume: "45034212".into(),
            latest_trading_day: "2025-02-10".into(),
            previous_close: "231.00".into(),
            change: "2.22".into(),
            change_percent: "0.9610%".into(),
        };
        let out = format_quote_report(&quote, None, "AAPL");
        assert!(out.contains("Stock Information for AAPL"));
        assert!(out.contains("Current Price: $233.22"));
        assert!(out.contains("↑ $2.22"));
        assert!(!out.contains("Investment Potential"));
    }

    #[test]
    fn test_verdict_highly_promising() {
        let quote = Quote {
            change: "1.50".into(),
            change_percent: "0.8%".into(),
            price: "100.0".into(),
            ..Default::default()
        };
        let f = Fundamentals {
            company_name: "Test Co".into(),
            market_cap: "5000000000".into(),
            pe_ratio: "12.0".into(),
            dividend_yield: "0.02".into(),
            beta: "0.9".into(),
            ..Default::default()
        };
        let out = format_quote_report(&quote, Some(&f), "TST");
        assert!(out.contains("Overall Promise: Highly Promising"));
        assert!(out.contains("Potentially Undervalued"));
    }

    #[test]
    fn test_verdict_requires_consideration() {
        let quote = Quote {
            change: "-1.50".into(),
            change_percent: "-0.8%".into(),
            ..Default::default()
        };
        let f = Fundamentals {
            company_name: "Test Co".into(),
            market_cap: "500000000".into(),
            pe_ratio: "40.0".into(),
            dividend_yield: "0".into(),
            beta: "1.8".into(),
            ..Default::default()
        };
        let out = format_quote_report(&quote, Some(&f), "TST");
        assert!(out.contains("Overall Promise: Requires Careful Consideration"));
        assert!(out.contains("High volatility"));
    }
}
