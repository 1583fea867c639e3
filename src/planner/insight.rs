//! Prompts for AI ride summaries

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MotoPlanError;
use crate::models::{NewSavedRoute, WeatherSample};

/// What to ask the generative model for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    /// Ride difficulty summary with a safety tip
    Insight,
    /// Gear checklist for the conditions
    Packing,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightKind::Insight => f.write_str("insight"),
            InsightKind::Packing => f.write_str("packing"),
        }
    }
}

impl FromStr for InsightKind {
    type Err = MotoPlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insight" => Ok(InsightKind::Insight),
            "packing" => Ok(InsightKind::Packing),
            other => Err(MotoPlanError::validation(format!(
                "Unknown insight kind '{other}'. Use 'insight' or 'packing'."
            ))),
        }
    }
}

/// Compact form of a sample as sent to the model
#[derive(Serialize)]
struct PromptSample<'a> {
    location: &'a str,
    temp: f64,
    condition: &'a str,
    wind: f64,
}

fn samples_json(samples: &[WeatherSample]) -> String {
    let compact: Vec<PromptSample<'_>> = samples
        .iter()
        .map(|s| PromptSample {
            location: &s.location,
            temp: s.temperature,
            condition: &s.condition,
            wind: s.wind_speed,
        })
        .collect();
    serde_json::to_string(&compact).unwrap_or_else(|_| "[]".to_string())
}

/// Build the prompt for `kind` from the planned trip and its weather samples
#[must_use]
pub fn build_prompt(kind: InsightKind, trip: &NewSavedRoute, samples: &[WeatherSample]) -> String {
    let weather = samples_json(samples);
    match kind {
        InsightKind::Insight => format!(
            "I am riding a motorcycle from {} to {}. Weather samples: {}. \
             Give a 3-sentence summary of ride difficulty and one pro safety tip.",
            trip.start, trip.end, weather
        ),
        InsightKind::Packing => format!(
            "Create a short bulleted motorcycle gear checklist for these conditions: {weather}"
        ),
    }
}
