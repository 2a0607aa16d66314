//! Weather question handler.
//!
//! Recognizes weather questions, extracts a location and optional date
//! expression, resolves the location via geocoding, and reports either
//! current conditions or per-day aggregate statistics. Current-weather and
//! forecast-by-date requests are disambiguated purely by which pattern
//! matched. This handler keeps no cross-turn state.

pub mod client;
pub mod dates;
pub mod stats;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate, Timelike};
use regex::Regex;

use crate::query::handler::QueryHandler;
use crate::query::session::SessionState;
use client::WeatherClient;

/// Days ahead the forecast collaborator can supply data for.
pub const FORECAST_HORIZON_DAYS: i64 = 16;

pub struct WeatherHandler {
    client: WeatherClient,
    patterns: Vec<Regex>,
    current_patterns: Vec<Regex>,
    forecast_patterns: Vec<Regex>,
    tomorrow_pattern: Regex,
}

enum Request {
    Current { location: String },
    Forecast { location: String, date_text: String },
    Tomorrow { location: String },
}

impl WeatherHandler {
    pub fn new(client: WeatherClient) -> Self {
        // Location groups exclude digits so a trailing date never folds into
        // the location capture.
        let loc_date =
            Regex::new(r"(?i)weather.*(?:in|for|at)\s+([a-zA-Z\s,]+)\s+(?:on|for)\s+([a-zA-Z0-9\s,/-]+?)\??$")
                .unwrap();
        let date_loc =
            Regex::new(r"(?i)weather.*(?:on|for)\s+([a-zA-Z0-9\s,/-]+?)\s+(?:in|for|at)\s+([a-zA-Z\s,]+?)\??$")
                .unwrap();
        let now_loc =
            Regex::new(r"(?i)weather.*(?:now|right now).*(?:in|for|at)\s+([a-zA-Z\s,]+?)\??$")
                .unwrap();
        let loc_now =
            Regex::new(r"(?i)weather.*(?:in|for|at)\s+([a-zA-Z\s,]+?)\s+(?:now|right now)\??$")
                .unwrap();
        let loc_only = Regex::new(r"(?i)weather.*(?:in|for|at)\s+([a-zA-Z\s,]+?)\??$").unwrap();
        let tomorrow =
            Regex::new(r"(?i)weather.*tomorrow.*(?:in|for|at)\s+([a-zA-Z\s,]+?)\??$").unwrap();

        Self {
            client,
            patterns: vec![
                loc_date.clone(),
                date_loc.clone(),
                now_loc.clone(),
                loc_now.clone(),
                loc_only.clone(),
                tomorrow.clone(),
            ],
            current_patterns: vec![now_loc, loc_now, loc_only],
            forecast_patterns: vec![loc_date, date_loc],
            tomorrow_pattern: tomorrow,
        }
    }

    /// Classify the question into a request shape. "Tomorrow" is checked
    /// first, then current-weather patterns, then explicit-date forecasts.
    fn parse_request(&self, question: &str) -> Option<Request> {
        if let Some(c) = self.tomorrow_pattern.captures(question) {
            return Some(Request::Tomorrow {
                location: c[1].trim().to_string(),
            });
        }

        for pattern in &self.current_patterns {
            if let Some(c) = pattern.captures(question) {
                return Some(Request::Current {
                    location: c[1].trim().to_string(),
                });
            }
        }

        for (i, pattern) in self.forecast_patterns.iter().enumerate() {
            if let Some(c) = pattern.captures(question) {
                // First pattern captures location then date, second the
                // reverse.
                let (location, date_text) = if i == 0 {
                    (c[1].trim().to_string(), c[2].trim().to_string())
                } else {
                    (c[2].trim().to_string(), c[1].trim().to_string())
                };
                return Some(Request::Forecast {
                    location,
                    date_text,
                });
            }
        }

        None
    }

    async fn answer_current(&self, location: &str) -> Result<String> {
        let Some(place) = self.client.geocode(location).await? else {
            return Ok(location_not_found(location));
        };

        let forecast = self.client.forecast(place.latitude, place.longitude).await?;
        let now = Local::now();
        let hour = now.hour() as usize;
        let Some(temp) = forecast.hourly.temperature_2m.get(hour) else {
            return Ok(no_data_message());
        };

        Ok(format!(
            "Current Weather Report\n\n\
             Location: {}\n\
             Time: {}\n\
             Current Temperature: {:.1}°C\n\
             Coordinates: {}, {}\n\
             Timezone: {}",
            place.display_name(),
            now.format("%I:%M %p"),
            temp,
            place.latitude,
            place.longitude,
            place.timezone,
        ))
    }

    async fn answer_forecast(&self, location: &str, date: NaiveDate) -> Result<String> {
        let today = Local::now().date_naive();
        let max_date = today + Duration::days(FORECAST_HORIZON_DAYS);
        if date > max_date {
            return Ok(format!(
                "Sorry, I can only provide weather forecasts up to {}. Please try with a closer date.",
                max_date.format("%m/%d/%Y")
            ));
        }

        let Some(place) = self.client.geocode(location).await? else {
            return Ok(location_not_found(location));
        };

        let forecast = self.client.forecast(place.latitude, place.longitude).await?;
        let Some(day) =
            stats::aggregate_for_date(&forecast.hourly.time, &forecast.hourly.temperature_2m, date)
        else {
            return Ok(no_data_message());
        };

        Ok(format!(
            "Current date: {}\n\n\
             Location coordinates: {}, {}\n\
             Weather forecast for {} on {}:\n\
             - Maximum temperature: {:.1}°C\n\
             - Minimum temperature: {:.1}°C\n\
             - Average temperature: {:.1}°C\n\
             - Timezone: {}",
            today.format("%A, %B %-d, %Y"),
            place.latitude,
            place.longitude,
            place.display_name(),
            date.format("%A, %B %-d, %Y"),
            day.max_temp,
            day.min_temp,
            day.avg_temp,
            place.timezone,
        ))
    }
}

fn location_not_found(location: &str) -> String {
    format!(
        "Sorry, I couldn't find the location: {location}. Please try with a different location name."
    )
}

fn no_data_message() -> String {
    "Sorry, no weather data is available for the specified date. Please try with a date within the next 16 days."
        .to_string()
}

#[async_trait]
impl QueryHandler for WeatherHandler {
    fn name(&self) -> &str {
        "Weather"
    }

    fn description(&self) -> &str {
        "Get weather forecasts for any location and date"
    }

    fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    async fn handle(&self, question: &str, _session: &mut SessionState) -> Result<Option<String>> {
        let Some(request) = self.parse_request(question) else {
            return Ok(None);
        };

        let response = match request {
            Request::Current { location } => self.answer_current(&location).await?,
            Request::Tomorrow { location } => {
                let today = Local::now().date_naive();
                match today.succ_opt() {
                    Some(tomorrow) => self.answer_forecast(&location, tomorrow).await?,
                    None => no_data_message(),
                }
            }
            Request::Forecast {
                location,
                date_text,
            } => {
                let today = Local::now().date_naive();
                match dates::parse_date(&date_text, today) {
                    Some(date) => self.answer_forecast(&location, date).await?,
                    None => format!(
                        "Sorry, I couldn't understand the date: {date_text}. Please try with a different date format."
                    ),
                }
            }
        };

        Ok(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> WeatherHandler {
        WeatherHandler::new(WeatherClient::new())
    }

    #[test]
    fn test_claims_weather_questions() {
        let h = handler();
        assert!(h.claims("what's the weather in Tokyo?"));
        assert!(h.claims("weather in Paris on Feb 15"));
        assert!(h.claims("weather right now in London"));
        assert!(!h.claims("stock price of Apple"));
    }

    #[test]
    fn test_parse_request_current() {
        let h = handler();
        match h.parse_request("what's the weather right now in London?") {
            Some(Request::Current { location }) => assert_eq!(location, "London"),
            _ => panic!("expected current-weather request"),
        }
    }

    #[test]
    fn test_parse_request_location_then_date() {
        let h = handler();
        match h.parse_request("weather in Tokyo on feb 15") {
            Some(Request::Forecast {
                location,
                date_text,
            }) => {
                assert_eq!(location, "Tokyo");
                assert_eq!(date_text, "feb 15");
            }
            _ => panic!("expected forecast request"),
        }
    }

    #[test]
    fn test_parse_request_date_then_location() {
        let h = handler();
        match h.parse_request("weather on feb 15 in Tokyo") {
            Some(Request::Forecast {
                location,
                date_text,
            }) => {
                assert_eq!(location, "Tokyo");
                assert_eq!(date_text, "feb 15");
            }
            _ => panic!("expected forecast request"),
        }
    }

    #[test]
    fn test_parse_request_tomorrow() {
        let h = handler();
        match h.parse_request("weather tomorrow in Hanoi") {
            Some(Request::Tomorrow { location }) => assert_eq!(location, "Hanoi"),
            _ => panic!("expected tomorrow request"),
        }
    }

    #[test]
    fn test_bare_location_is_current_weather() {
        let h = handler();
        match h.parse_request("weather in Tokyo") {
            Some(Request::Current { location }) => assert_eq!(location, "Tokyo"),
            _ => panic!("expected current-weather request"),
        }
    }

    #[test]
    fn test_unrelated_question_yields_none() {
        let h = handler();
        assert!(h.parse_request("how is Apple stock doing").is_none());
    }
}
