//! Forward geocoding via Nominatim (OpenStreetMap)

use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{GeoApiClient, ensure_success, read_json, send};
use crate::Result;
use crate::error::{MotoPlanError, Service};
use crate::models::Location;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimPlace {
    fn into_location(self) -> Result<Location> {
        let parse = |value: &str| {
            value.trim().parse::<f64>().map_err(|_| {
                MotoPlanError::remote(
                    Service::Geocoding,
                    None,
                    format!("invalid coordinate '{value}' for {}", self.display_name),
                )
            })
        };
        let latitude = parse(&self.lat)?;
        let longitude = parse(&self.lon)?;
        Ok(Location::new(latitude, longitude, self.display_name))
    }
}

impl GeoApiClient {
    /// Resolve a free-text place name to the geocoder's best match
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Option<Location>> {
        let url = format!(
            "{}/search?format=json&q={}",
            self.services.geocoding_url.trim_end_matches('/'),
            urlencoding::encode(query)
        );

        let response = send(Service::Geocoding, self.client.get(&url)).await?;
        let response = ensure_success(Service::Geocoding, response, |status| {
            format!("Could not find location: {query} ({status})")
        })
        .await?;
        let places: Vec<NominatimPlace> = read_json(Service::Geocoding, response).await?;

        let Some(place) = places.into_iter().next() else {
            warn!("No results found for location '{}'", query);
            return Ok(None);
        };

        let location = place.into_location()?;
        info!(
            "Geocoded '{}' to {} ({})",
            query,
            location.name,
            location.format_coordinates()
        );
        Ok(Some(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_parses_string_coordinates() {
        let place = NominatimPlace {
            lat: "34.0536909".to_string(),
            lon: "-118.242766".to_string(),
            display_name: "Los Angeles, California, United States".to_string(),
        };
        let location = place.into_location().unwrap();
        assert_eq!(location.latitude, 34.0536909);
        assert_eq!(location.longitude, -118.242766);
    }

    #[test]
    fn test_place_with_garbage_coordinates() {
        let place = NominatimPlace {
            lat: "north".to_string(),
            lon: "0".to_string(),
            display_name: "Somewhere".to_string(),
        };
        assert!(matches!(
            place.into_location(),
            Err(MotoPlanError::Remote { .. })
        ));
    }
}
