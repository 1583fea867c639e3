//! Deciding which weather samples become map markers
//!
//! Showing a marker for every sample clutters the map, so only the endpoints,
//! notable changes and every Nth sample are displayed.

use serde::{Deserialize, Serialize};

use crate::config::SamplingConfig;
use crate::models::{Coordinate, WeatherSample};

/// Lossy filter over the samples of one route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerFilter {
    /// A temperature change strictly greater than this forces a marker
    pub temperature_delta: f64,
    /// Indices that are a multiple of this are always shown
    pub every: usize,
}

impl Default for MarkerFilter {
    fn default() -> Self {
        Self {
            temperature_delta: 3.0,
            every: 3,
        }
    }
}

impl From<&SamplingConfig> for MarkerFilter {
    fn from(sampling: &SamplingConfig) -> Self {
        Self {
            temperature_delta: sampling.temperature_delta,
            every: sampling.marker_every.max(1),
        }
    }
}

impl MarkerFilter {
    /// Should the sample at `index` (of `count`) be displayed, given the last
    /// sample that was displayed?
    #[must_use]
    pub fn should_display(
        &self,
        sample: &WeatherSample,
        index: usize,
        count: usize,
        last_displayed: Option<&WeatherSample>,
    ) -> bool {
        if index == 0 || index + 1 == count {
            return true;
        }

        let every_nth = index % self.every.max(1) == 0;
        match last_displayed {
            Some(previous) => {
                (sample.temperature - previous.temperature).abs() > self.temperature_delta
                    || sample.condition != previous.condition
                    || every_nth
            }
            None => every_nth,
        }
    }

    /// Markers for an ordered list of samples
    #[must_use]
    pub fn select(&self, samples: &[WeatherSample]) -> Vec<Marker> {
        let mut markers = Vec::new();
        let mut last_displayed: Option<&WeatherSample> = None;
        for (index, sample) in samples.iter().enumerate() {
            if self.should_display(sample, index, samples.len(), last_displayed) {
                markers.push(Marker::from_sample(index, sample));
                last_displayed = Some(sample);
            }
        }
        markers
    }
}

/// A weather sample surfaced as a map annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Position of the sample in the route's sample list
    pub sample_index: usize,
    pub coordinate: Coordinate,
    pub title: String,
    /// Rounded temperature in Celsius
    pub temperature: i32,
    pub description: String,
    pub icon_url: String,
}

impl Marker {
    #[must_use]
    pub fn from_sample(sample_index: usize, sample: &WeatherSample) -> Self {
        let title = if sample.location.trim().is_empty() {
            "Checkpoint".to_string()
        } else {
            sample.location.clone()
        };

        Self {
            sample_index,
            coordinate: sample.coordinate,
            title,
            temperature: sample.temperature.round() as i32,
            description: sample.description.clone(),
            icon_url: format!("https://openweathermap.org/img/wn/{}@2x.png", sample.icon),
        }
    }
}
