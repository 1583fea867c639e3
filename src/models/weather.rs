//! Weather report and route sample models

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Current-conditions payload from the weather service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReport {
    /// Nearest named place, may be empty in remote areas
    #[serde(default)]
    pub name: String,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    pub wind: Wind,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MainReadings {
    /// Temperature in Celsius
    pub temp: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Condition {
    /// Condition group, e.g. "Rain" or "Clouds"
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Wind {
    /// Wind speed in m/s
    pub speed: f64,
}

/// Weather observed at one sampled point along a route
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSample {
    pub location: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Condition label used to detect changes between samples
    pub condition: String,
    pub description: String,
    pub icon: String,
    /// Wind speed in m/s
    pub wind_speed: f64,
    pub coordinate: Coordinate,
}

impl WeatherSample {
    /// Build a sample from a weather report taken at `coordinate`
    #[must_use]
    pub fn from_report(report: WeatherReport, coordinate: Coordinate) -> Self {
        let condition = report.weather.into_iter().next();
        let (condition, description, icon) = match condition {
            Some(c) => (c.main, c.description, c.icon),
            None => (String::new(), String::new(), String::new()),
        };

        Self {
            location: report.name,
            temperature: report.main.temp,
            condition,
            description,
            icon,
            wind_speed: report.wind.speed,
            coordinate,
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.0}°C", self.temperature.round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_json() -> &'static str {
        r#"{
            "name": "Barstow",
            "main": {"temp": 31.4, "humidity": 12},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "wind": {"speed": 5.7, "deg": 250}
        }"#
    }

    #[test]
    fn test_report_ignores_extra_fields() {
        let report: WeatherReport = serde_json::from_str(report_json()).unwrap();
        assert_eq!(report.name, "Barstow");
        assert_eq!(report.weather[0].main, "Clear");
        assert_eq!(report.wind.speed, 5.7);
    }

    #[test]
    fn test_sample_from_report() {
        let report: WeatherReport = serde_json::from_str(report_json()).unwrap();
        let sample = WeatherSample::from_report(report, Coordinate::new(-117.0, 34.9));
        assert_eq!(sample.location, "Barstow");
        assert_eq!(sample.temperature, 31.4);
        assert_eq!(sample.condition, "Clear");
        assert_eq!(sample.icon, "01d");
        assert_eq!(sample.format_temperature(), "31°C");
    }

    #[test]
    fn test_report_without_name() {
        let report: WeatherReport = serde_json::from_str(
            r#"{
                "main": {"temp": 2.0},
                "weather": [{"main": "Snow", "description": "light snow", "icon": "13n"}],
                "wind": {"speed": 0.0}
            }"#,
        )
        .unwrap();
        let sample = WeatherSample::from_report(report, Coordinate::new(0.0, 0.0));
        assert!(sample.location.is_empty());
        assert_eq!(sample.condition, "Snow");
        assert_eq!(sample.format_temperature(), "2°C");
    }
}
