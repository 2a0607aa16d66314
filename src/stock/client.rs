//! Alpha Vantage quote and fundamentals client.

use anyhow::Result;
use serde::Deserialize;

use crate::errors::ProviderError;

const API_URL: &str = "https://www.alphavantage.co/query";

/// One GLOBAL_QUOTE record. Alpha Vantage returns every field as a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Quote {
    #[serde(rename = "01. symbol", default)]
    pub symbol: String,
    #[serde(rename = "02. open", default)]
    pub open: String,
    #[serde(rename = "03. high", default)]
    pub high: String,
    #[serde(rename = "04. low", default)]
    pub low: String,
    #[serde(rename = "05. price", default)]
    pub price: String,
    #[serde(rename = "06. volume", default)]
    pub volume: String,
    #[serde(rename = "07. latest trading day", default)]
    pub latest_trading_day: String,
    #[serde(rename = "08. previous close", default)]
    pub previous_close: String,
    #[serde(rename = "09. change", default)]
    pub change: String,
    #[serde(rename = "10. change percent", default)]
    pub change_percent: String,
}

impl Quote {
    /// An unknown symbol yields an empty quote object, not an HTTP error.
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty() && self.price.is_empty()
    }

    pub fn price_f64(&self) -> f64 {
        self.price.parse().unwrap_or(0.0)
    }

    pub fn change_f64(&self) -> f64 {
        self.change.parse().unwrap_or(0.0)
    }

    pub fn percent_change_f64(&self) -> f64 {
        self.change_percent.trim_end_matches('%').parse().unwrap_or(0.0)
    }

    pub fn volume_u64(&self) -> u64 {
        self.volume.parse().unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "Global Quote", default)]
    global_quote: Option<Quote>,
}

/// OVERVIEW fundamentals snapshot, kept as strings the way the API
/// delivers them; numeric accessors parse on demand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fundamentals {
    #[serde(rename = "Name", default)]
    pub company_name: String,
    #[serde(rename = "Industry", default)]
    pub industry: String,
    #[serde(rename = "MarketCapitalization", default)]
    pub market_cap: String,
    #[serde(rename = "PERatio", default)]
    pub pe_ratio: String,
    #[serde(rename = "DividendYield", default)]
    pub dividend_yield: String,
    #[serde(rename = "EPS", default)]
    pub eps: String,
    #[serde(rename = "Beta", default)]
    pub beta: String,
    #[serde(rename = "50DayMovingAverage", default)]
    pub fifty_day_moving_average: String,
    #[serde(rename = "200DayMovingAverage", default)]
    pub two_hundred_day_moving_average: String,
}

impl Fundamentals {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_empty()
    }

    pub fn market_cap_u64(&self) -> u64 {
        self.market_cap.parse().unwrap_or(0)
    }

    pub fn market_cap_millions(&self) -> f64 {
        self.market_cap_u64() as f64 / 1_000_000.0
    }

    pub fn pe_ratio_f64(&self) -> f64 {
        self.pe_ratio.parse().unwrap_or(0.0)
    }

    /// Dividend yield as a percentage (the API reports a fraction).
    pub fn dividend_yield_pct(&self) -> f64 {
        self.dividend_yield.parse::<f64>().unwrap_or(0.0) * 100.0
    }

    pub fn beta_f64(&self) -> f64 {
        self.beta.parse().unwrap_or(0.0)
    }
}

/// HTTP client for the Alpha Vantage collaborator.
pub struct StockClient {
    client: reqwest::Client,
    api_key: String,
}

impl StockClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        function: &str,
        symbol: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::ServerError {
                status: response.status().as_u16(),
                message: format!("{function} request for {symbol} failed"),
            }
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::JsonParseError(e.to_string()).into())
    }

    /// Fetch the current quote; `None` when the API returns the empty-quote
    /// sentinel for an unknown symbol.
    pub async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        let body: QuoteResponse = self.query("GLOBAL_QUOTE", symbol).await?;
        Ok(body.global_quote.filter(|q| !q.is_empty()))
    }

    /// Fetch the fundamentals snapshot; `None` when the symbol has none.
    pub async fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>> {
        let body: Fundamentals = self.query("OVERVIEW", symbol).await?;
        Ok(if body.is_empty() { None } else { Some(body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_parses_alpha_vantage_shape() {
        let json = r#"{
            "Global Quote": {
                "01. symbol": "AAPL",
                "02. open": "230.00",
                "03. high": "234.50",
                "04. low": "229.10",
                "05. price": "233.22",
                "06. volume": "45034212",
                "07. latest trading day": "2025-02-10",
                "08. previous close": "231.00",
                "09. change": "2.22",
                "10. change percent": "0.9610%"
            }
        }"#;
        let body: QuoteResponse = serde_json::from_str(json).unwrap();
        let q = body.global_quote.unwrap();
        assert_eq!(q.symbol, "AAPL");
        assert_eq!(q.price_f64(), 233.22);
        assert_eq!(q.percent_change_f64(), 0.9610);
        assert_eq!(q.volume_u64(), 45034212);
        assert!(!q.is_empty());
    }

    #[test]
    fn test_empty_quote_sentinel() {
        let json = r#"{"Global Quote": {}}"#;
        let body: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(body.global_quote.unwrap().is_empty());
    }

    #[test]
    fn test_fundamentals_accessors() {
        let json = r#"{
            "Name": "Apple Inc",
            "Industry": "Consumer Electronics",
            "MarketCapitalization": "3500000000000",
            "PERatio": "35.2",
            "DividendYield": "0.0045",
            "EPS": "6.62",
            "Beta": "1.25",
            "50DayMovingAverage": "228.4",
            "200DayMovingAverage": "215.7"
        }"#;
        let f: Fundamentals = serde_json::from_str(json).unwrap();
        assert_eq!(f.market_cap_millions(), 3_500_000.0);
        assert_eq!(f.pe_ratio_f64(), 35.2);
        assert!((f.dividend_yield_pct() - 0.45).abs() < 1e-9);
        assert!(!f.is_empty());
    }

    #[test]
    fn test_fundamentals_empty_sentinel() {
        let f: Fundamentals = serde_json::from_str("{}").unwrap();
        assert!(f.is_empty());
    }
}
