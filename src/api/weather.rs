//! Current conditions via OpenWeatherMap

use tracing::{debug, instrument};

use super::{GeoApiClient, ensure_success, read_json, send};
use crate::Result;
use crate::error::{MotoPlanError, Service};
use crate::models::{Coordinate, WeatherReport};

impl GeoApiClient {
    /// Current weather at a coordinate, metric units
    #[instrument(skip(self, key), fields(lat = at.latitude, lon = at.longitude))]
    pub async fn current_weather(&self, at: Coordinate, key: &str) -> Result<WeatherReport> {
        let url = format!(
            "{}/weather?lat={}&lon={}&units=metric&appid={}",
            self.services.weather_url.trim_end_matches('/'),
            at.latitude,
            at.longitude,
            urlencoding::encode(key)
        );

        let response = send(Service::Weather, self.client.get(&url)).await?;
        let response = ensure_success(Service::Weather, response, |status| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
        .await?;
        let report: WeatherReport = read_json(Service::Weather, response).await?;
        let Some(condition) = report.weather.first() else {
            return Err(MotoPlanError::remote(
                Service::Weather,
                None,
                "Weather response has no conditions",
            ));
        };

        debug!(
            "Weather at {}: {:.1}°C, {} wind {:.1} m/s",
            report.name,
            report.main.temp,
            condition.main,
            report.wind.speed
        );
        Ok(report)
    }
}
