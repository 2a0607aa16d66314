//! Open-Meteo geocoding and forecast clients.

use anyhow::Result;
use serde::Deserialize;

use crate::errors::ProviderError;

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub admin1: Option<String>,
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub hourly: HourlySeries,
}

impl GeocodingResult {
    /// "Tokyo, Tokyo, Japan" when an admin region is known, else
    /// "Tokyo, Japan".
    pub fn display_name(&self) -> String {
        match &self.admin1 {
            Some(admin) => format!("{}, {}, {}", self.name, admin, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// HTTP client for the Open-Meteo collaborators. No API key required.
pub struct WeatherClient {
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Resolve a free-text location to its best geocoding match, `None`
    /// when the service knows no such place.
    pub async fn geocode(&self, location: &str) -> Result<Option<GeocodingResult>> {
        let response = self
            .client
            .get(GEOCODING_URL)
            .query(&[
                ("name", location),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::ServerError {
                status: response.status().as_u16(),
                message: "geocoding request failed".to_string(),
            }
            .into());
        }

        let body: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonParseError(e.to_string()))?;

        Ok(body.results.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }))
    }

    /// Fetch the hourly temperature series for a coordinate pair.
    pub async fn forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastResponse> {
        let response = self
            .client
            .get(FORECAST_URL)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", "temperature_2m".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::ServerError {
                status: response.status().as_u16(),
                message: "forecast request failed".to_string(),
            }
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::JsonParseError(e.to_string()).into())
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}
