//! Natural-language date parsing for weather questions.
//!
//! An ordered grammar: the first pattern that both matches and yields a
//! valid calendar date wins. Unparseable input is `None`, never an error.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s*(\d{4})?$",
    )
    .unwrap()
});

static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s*,?\s*(\d{4})?$",
    )
    .unwrap()
});

static ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$").unwrap());

// US ordering assumed (MM/DD/YYYY); day<=12 inputs are not disambiguated.
static US_SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4})$").unwrap());

static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(next|this)\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$")
        .unwrap()
});

static COMPACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s*(\d{1,2})$")
        .unwrap()
});

fn month_number(prefix: &str) -> Option<u32> {
    let n = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

fn weekday_number(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a free-text date expression relative to `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let input = input.trim().to_lowercase();

    if input == "tomorrow" {
        return today.succ_opt();
    }

    if let Some(c) = MONTH_DAY_RE.captures(&input) {
        let month = month_number(&c[1])?;
        let day: u32 = c[2].parse().ok()?;
        let year: i32 = c
            .get(3)
            .and_then(|y| y.as_str().parse().ok())
            .unwrap_or(today.year());
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(d);
        }
    }

    if let Some(c) = DAY_MONTH_RE.captures(&input) {
        let day: u32 = c[1].parse().ok()?;
        let month = month_number(&c[2])?;
        let year: i32 = c
            .get(3)
            .and_then(|y| y.as_str().parse().ok())
            .unwrap_or(today.year());
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(d);
        }
    }

    if let Some(c) = ISO_RE.captures(&input) {
        let year: i32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let day: u32 = c[3].parse().ok()?;
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(d);
        }
    }

    if let Some(c) = US_SLASH_RE.captures(&input) {
        let month: u32 = c[1].parse().ok()?;
        let day: u32 = c[2].parse().ok()?;
        let year: i32 = c[3].parse().ok()?;
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(d);
        }
    }

    if let Some(c) = WEEKDAY_RE.captures(&input) {
        let target = weekday_number(&c[2])?;
        let current = today.weekday().num_days_from_sunday() as i64;
        let wanted = target.num_days_from_sunday() as i64;
        let mut days_to_add = wanted - current;
        // "next" always rolls a week forward; "this" only when the target
        // weekday already passed.
        if &c[1] == "next" {
            days_to_add += 7;
        } else if days_to_add <= 0 {
            days_to_add += 7;
        }
        return Some(today + Duration::days(days_to_add));
    }

    if let Some(c) = COMPACT_RE.captures(&input) {
        let month = month_number(&c[1])?;
        let day: u32 = c[2].parse().ok()?;
        if let Some(d) = NaiveDate::from_ymd_opt(today.year(), month, day) {
            return Some(d);
        }
    }

    // Last resort: a few common verbose formats.
    for fmt in ["%B %d, %Y", "%B %d %Y", "%d %B %Y", "%Y %B %d"] {
        if let Ok(d) = NaiveDate::parse_from_str(&input, fmt) {
            return Some(d);
        }
    }

    None
}
