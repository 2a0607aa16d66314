//! Company-name → ticker resolution.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Static company-name → ticker mapping. Keys are normalized names as
/// produced by [`normalize_company_name`].
pub static COMPANY_TO_SYMBOL: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let entries: &[(&str, &str)] = &[
        // Tech
        ("APPLE", "AAPL"),
        ("MICROSOFT", "MSFT"),
        ("GOOGLE", "GOOGL"),
        ("ALPHABET", "GOOGL"),
        ("AMAZON", "AMZN"),
        ("TESLA", "TSLA"),
        ("META", "META"),
        ("FACEBOOK", "META"),
        ("NETFLIX", "NFLX"),
        ("NVIDIA", "NVDA"),
        ("AMD", "AMD"),
        ("INTEL", "INTC"),
        ("IBM", "IBM"),
        ("ORACLE", "ORCL"),
        ("SALESFORCE", "CRM"),
        ("ADOBE", "ADBE"),
        // Consumer
        ("WALMART", "WMT"),
        ("DISNEY", "DIS"),
        ("COCA COLA", "KO"),
        ("COKE", "KO"),
        ("MCDONALDS", "MCD"),
        ("NIKE", "NKE"),
        ("STARBUCKS", "SBUX"),
        ("TARGET", "TGT"),
        ("COSTCO", "COST"),
        // Financial
        ("JPMORGAN", "JPM"),
        ("JP MORGAN", "JPM"),
        ("GOLDMAN SACHS", "GS"),
        ("BANK OF AMERICA", "BAC"),
        ("VISA", "V"),
        ("MASTERCARD", "MA"),
        ("AMERICAN EXPRESS", "AXP"),
        // Other majors
        ("BOEING", "BA"),
        ("GENERAL ELECTRIC", "GE"),
        ("GE", "GE"),
        ("FORD", "F"),
        ("GENERAL MOTORS", "GM"),
        ("GM", "GM"),
        ("AT AND T", "T"),
        ("VERIZON", "VZ"),
        ("EXXON", "XOM"),
        ("EXXONMOBIL", "XOM"),
        ("CHEVRON", "CVX"),
        ("PFIZER", "PFE"),
        ("JOHNSON AND JOHNSON", "JNJ"),
        ("PROCTER AND GAMBLE", "PG"),
        ("P AND G", "PG"),
        // Vietnamese companies
        ("VINGROUP", "VIC"),
        ("VINHOMES", "VHM"),
        ("VINCOM RETAIL", "VRE"),
        ("VIETCOMBANK", "VCB"),
        ("TECHCOMBANK", "TCB"),
        ("VPBANK", "VPB"),
        ("VINAMILK", "VNM"),
        ("MASAN", "MSN"),
        ("PV GAS", "GAS"),
        ("HOA PHAT", "HPG"),
        ("SABECO", "SAB"),
        ("VIETJET", "VJC"),
        ("FPT", "FPT"),
        ("MOBIFONE", "MBF"),
        ("PETROLIMEX", "PLX"),
        ("VIETTEL", "VTL"),
        ("VIETNAM AIRLINES", "HVN"),
        ("BIDV", "BID"),
        ("MB BANK", "MBB"),
        ("ACB BANK", "ACB"),
        ("VIETINBANK", "CTG"),
        ("SACOMBANK", "STB"),
        ("PV POWER", "POW"),
        ("VIGLACERA", "VGC"),
        ("NOVALAND", "NVL"),
        ("VINACONEX", "VCG"),
        ("VICOSTONE", "VCS"),
        ("VNDIRECT", "VND"),
        ("SSI", "SSI"),
        ("PHAT DAT", "PDR"),
        // Common local spellings
        ("VIETCOM BANK", "VCB"),
        ("TECH COM BANK", "TCB"),
        ("VP BANK", "VPB"),
        ("VIET JET", "VJC"),
        ("VIETNAM GAS", "GAS"),
        ("PETRO VIETNAM GAS", "GAS"),
        ("VIETNAM STEEL", "HPG"),
        ("VIETNAM DAIRY", "VNM"),
        // Ticker-as-name forms
        ("VIC", "VIC"),
        ("VHM", "VHM"),
        ("VCB", "VCB"),
        ("TCB", "TCB"),
        ("VPB", "VPB"),
        ("VNM", "VNM"),
        ("MSN", "MSN"),
        ("HPG", "HPG"),
    ];
    entries.iter().copied().collect()
});

static BARE_SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{1,5}\b").unwrap());

static FOLLOW_UP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:it|this stock|that stock)").unwrap(),
        Regex::new(r"(?i)promising|compare|performance").unwrap(),
        Regex::new(r"(?i)(?:best|top|current|market)\s+(?:stocks?|performing)").unwrap(),
    ]
});

/// Normalize a candidate company name for map lookup: uppercase, expand
/// ampersands, strip punctuation, collapse whitespace, drop common
/// corporate suffixes.
pub fn normalize_company_name(name: &str) -> String {
    let upper = name.to_uppercase().replace('&', " AND ");
    let cleaned: String = upper
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let mut collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for suffix in [" CORP", " GROUP", " JSC", " JOINT STOCK"] {
        if let Some(stripped) = collapsed.strip_suffix(suffix) {
            collapsed = stripped.to_string();
        }
    }
    collapsed.trim().to_string()
}

/// How a symbol was resolved, which determines cache handling: a newly
/// named entity invalidates the session cache, a cached reuse must not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolResolution {
    New(String),
    Cached(String),
}

impl SymbolResolution {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolResolution::New(s) | SymbolResolution::Cached(s) => s,
        }
    }
}

/// Resolve a stock symbol from the question, first match wins:
/// extracted entity candidates, bare uppercase ticker tokens, individual
/// words, and finally the cached symbol when the question is a follow-up.
pub fn resolve_symbol(
    question: &str,
    candidates: &[String],
    cached_symbol: Option<&str>,
) -> Option<SymbolResolution> {
    for candidate in candidates {
        let normalized = normalize_company_name(candidate);
        if let Some(symbol) = COMPANY_TO_SYMBOL.get(normalized.as_str()) {
            return Some(SymbolResolution::New(symbol.to_string()));
        }
    }

    for m in BARE_SYMBOL_RE.find_iter(question) {
        let token = m.as_str();
        if COMPANY_TO_SYMBOL.values().any(|v| *v == token) {
            return Some(SymbolResolution::New(token.to_string()));
        }
    }

    for word in question.split_whitespace() {
        let normalized = normalize_company_name(word);
        if let Some(symbol) = COMPANY_TO_SYMBOL.get(normalized.as_str()) {
            return Some(SymbolResolution::New(symbol.to_string()));
        }
    }

    let is_follow_up = FOLLOW_UP_PATTERNS.iter().any(|p| p.is_match(question));
    if is_follow_up {
        if let Some(symbol) = cached_symbol {
            return Some(SymbolResolution::Cached(symbol.to_string()));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_suffixes() {
        assert_eq!(normalize_company_name("Apple Inc."), "APPLE INC");
        assert_eq!(normalize_company_name("Hoa Phat Group"), "HOA PHAT");
        assert_eq!(normalize_company_name("Johnson & Johnson"), "JOHNSON AND JOHNSON");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_company_name("  coca   cola  "), "COCA COLA");
    }

    #[test]
    fn test_resolve_via_candidate() {
        let r = resolve_symbol(
            "how is apple doing",
            &["Apple".to_string()],
            None,
        );
        assert_eq!(r, Some(SymbolResolution::New("AAPL".to_string())));
    }

    #[test]
    fn test_resolve_via_bare_ticker() {
        let r = resolve_symbol("what is TSLA trading at", &[], None);
        assert_eq!(r, Some(SymbolResolution::New("TSLA".to_string())));
    }

    #[test]
    fn test_resolve_via_word_scan() {
        let r = resolve_symbol("microsoft stock price please", &[], None);
        assert_eq!(r, Some(SymbolResolution::New("MSFT".to_string())));
    }

    #[test]
    fn test_resolve_follow_up_uses_cache() {
        let r = resolve_symbol("is it promising?", &[], Some("AAPL"));
        assert_eq!(r, Some(SymbolResolution::Cached("AAPL".to_string())));
    }

    #[test]
    fn test_follow_up_without_cache_is_none() {
        assert_eq!(resolve_symbol("is it promising?", &[], None), None);
    }

    #[test]
    fn test_new_entity_beats_cache() {
        let r = resolve_symbol("compare Tesla stock performance", &[], Some("AAPL"));
        assert_eq!(r, Some(SymbolResolution::New("TSLA".to_string())));
    }

    #[test]
    fn test_no_symbol_found() {
        assert_eq!(resolve_symbol("tell me a joke", &[], None), None);
    }
}
