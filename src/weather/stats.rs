//! Hourly temperature aggregation.

use chrono::NaiveDate;

/// Max/min/mean over one calendar day, each rounded to one decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct DayStats {
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_temp: f64,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Aggregate the hourly samples whose ISO timestamp falls on `date`.
///
/// `None` means the series has no samples for that day — a distinct
/// condition from a date that failed to parse upstream.
pub fn aggregate_for_date(times: &[String], temps: &[f64], date: NaiveDate) -> Option<DayStats> {
    let prefix = date.format("%Y-%m-%d").to_string();
    let day_temps: Vec<f64> = times
        .iter()
        .zip(temps.iter())
        .filter(|(t, _)| t.starts_with(&prefix))
        .map(|(_, v)| *v)
        .collect();

    if day_temps.is_empty() {
        return None;
    }

    let max = day_temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = day_temps.iter().cloned().fold(f64::INFINITY, f64::min);
    let avg = day_temps.iter().sum::<f64>() / day_temps.len() as f64;

    Some(DayStats {
        max_temp: round1(max),
        min_temp: round1(min),
        avg_temp: round1(avg),
    })
}
