//! State of one planning session

use super::{PlanFailure, PlanReport};
use crate::marker::Marker;
use crate::models::{NewSavedRoute, Route, WeatherSample};

/// The current route and its weather, owned by the planner.
///
/// At most one plan is current; starting a new plan clears it first.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<PlanReport>,
    last_failure: Option<String>,
}

impl Session {
    /// The last successful plan, if the latest run succeeded
    #[must_use]
    pub fn current(&self) -> Option<&PlanReport> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn route(&self) -> Option<&Route> {
        self.current.as_ref().map(|report| &report.route)
    }

    #[must_use]
    pub fn samples(&self) -> &[WeatherSample] {
        self.current
            .as_ref()
            .map(|report| report.samples.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        self.current
            .as_ref()
            .map(|report| report.markers.as_slice())
            .unwrap_or_default()
    }

    /// The trip that would be saved
    #[must_use]
    pub fn trip(&self) -> Option<NewSavedRoute> {
        self.current.as_ref().map(PlanReport::trip)
    }

    /// Message of the last failed plan
    #[must_use]
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub(super) fn begin(&mut self) {
        self.current = None;
        self.last_failure = None;
    }

    pub(super) fn finish(&mut self, outcome: &Result<PlanReport, PlanFailure>) {
        match outcome {
            Ok(report) => self.current = Some(report.clone()),
            Err(failure) => self.last_failure = Some(failure.message()),
        }
    }
}
