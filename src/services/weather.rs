use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

const API_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct WeatherReport {
    pub temperature: i64,
    pub condition: String,
    pub wind_speed: i64,
    pub road_condition: &'static str,
    pub description: String,
    pub demo: bool,
}

/// Payload served when no API key is configured or the provider is down.
pub fn demo_report() -> WeatherReport {
    WeatherReport {
        temperature: 15,
        condition: "clear".to_string(),
        wind_speed: 5,
        road_condition: "dry",
        description: "Clear".to_string(),
        demo: true,
    }
}

/// Riders care about the road more than the sky: rain family means wet,
/// anything frozen (or freezing) means icy.
pub fn road_condition(condition: &str, temperature: i64) -> &'static str {
    match condition {
        "rain" | "drizzle" | "thunderstorm" => "wet",
        "snow" | "sleet" => "icy",
        _ if temperature < 0 => "icy",
        _ => "dry",
    }
}

pub async fn fetch(
    http: &reqwest::Client,
    api_key: &str,
    city: &str,
) -> Result<WeatherReport, reqwest::Error> {
    let url = format!(
        "https://api.openweathermap.org/data/2.5/weather?q={}&appid={}&units=metric&lang=ru",
        city, api_key
    );

    let data: Value = http
        .get(&url)
        .timeout(API_TIMEOUT)
        .send()
        .await?
        .json()
        .await?;

    let temperature = data["main"]["temp"].as_f64().unwrap_or(0.0).round() as i64;
    let condition = data["weather"][0]["main"]
        .as_str()
        .unwrap_or("clear")
        .to_lowercase();
    let description = data["weather"][0]["description"]
        .as_str()
        .unwrap_or("")
        .to_string();
    let wind_speed = data["wind"]["speed"].as_f64().unwrap_or(0.0).round() as i64;

    Ok(WeatherReport {
        road_condition: road_condition(&condition, temperature),
        temperature,
        condition,
        wind_speed,
        description,
        demo: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rain_means_wet_roads() {
        assert_eq!(road_condition("rain", 10), "wet");
        assert_eq!(road_condition("drizzle", 3), "wet");
        assert_eq!(road_condition("thunderstorm", 20), "wet");
    }

    #[test]
    fn snow_or_frost_means_ice() {
        assert_eq!(road_condition("snow", -5), "icy");
        assert_eq!(road_condition("sleet", 1), "icy");
        assert_eq!(road_condition("clear", -1), "icy");
    }

    #[test]
    fn mild_clear_weather_is_dry() {
        assert_eq!(road_condition("clear", 15), "dry");
        assert_eq!(road_condition("clouds", 0), "dry");
    }

    #[test]
    fn demo_payload_is_flagged() {
        let report = demo_report();
        assert!(report.demo);
        assert_eq!(report.road_condition, "dry");
    }
}
