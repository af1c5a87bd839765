//! Flight state: validated speed samples and timestamped platform state.
//!
//! # Freshness
//!
//! A `FlightState` is only usable while `now - captured_at < 5 s`. Nothing
//! expires it in the background: the consumer asks `is_fresh_at(now, ..)`
//! right before it solves.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::geo::{GeoPosition, ValidationError};

/// Default freshness window for telemetry samples.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(5);

/// Divergence ratio above which a speed sample is flagged implausible.
pub const SPEED_DIVERGENCE_WARNING_RATIO: f64 = 0.5;

/// Non-fatal plausibility finding on a speed sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlausibilityWarning {
    /// Airspeed and groundspeed differ by more than the warning ratio.
    SpeedDivergence {
        airspeed: f64,
        groundspeed: f64,
        ratio: f64,
    },
}

impl fmt::Display for PlausibilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlausibilityWarning::SpeedDivergence {
                airspeed,
                groundspeed,
                ratio,
            } => write!(
                f,
                "airspeed {:.1} m/s and groundspeed {:.1} m/s diverge by {:.0}%",
                airspeed,
                groundspeed,
                ratio * 100.0
            ),
        }
    }
}

/// Airspeed and groundspeed in m/s, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedSample {
    airspeed: f64,
    groundspeed: f64,
}

impl SpeedSample {
    /// Create a validated speed sample.
    ///
    /// A large airspeed/groundspeed divergence does not fail construction;
    /// see [`SpeedSample::plausibility_warning`].
    ///
    /// # Errors
    ///
    /// `ValidationError::InvalidSpeed` when either value is non-positive or
    /// not finite.
    pub fn new(airspeed: f64, groundspeed: f64) -> Result<Self, ValidationError> {
        if !airspeed.is_finite() || airspeed <= 0.0 {
            return Err(ValidationError::InvalidSpeed {
                field: "airspeed",
                value: airspeed,
            });
        }
        if !groundspeed.is_finite() || groundspeed <= 0.0 {
            return Err(ValidationError::InvalidSpeed {
                field: "groundspeed",
                value: groundspeed,
            });
        }
        Ok(Self {
            airspeed,
            groundspeed,
        })
    }

    pub fn airspeed(&self) -> f64 {
        self.airspeed
    }

    pub fn groundspeed(&self) -> f64 {
        self.groundspeed
    }

    /// `|airspeed - groundspeed| / max(airspeed, groundspeed)`.
    pub fn divergence_ratio(&self) -> f64 {
        (self.airspeed - self.groundspeed).abs() / self.airspeed.max(self.groundspeed)
    }

    /// Warning when the divergence ratio exceeds 50%.
    pub fn plausibility_warning(&self) -> Option<PlausibilityWarning> {
        let ratio = self.divergence_ratio();
        (ratio > SPEED_DIVERGENCE_WARNING_RATIO).then_some(PlausibilityWarning::SpeedDivergence {
            airspeed: self.airspeed,
            groundspeed: self.groundspeed,
            ratio,
        })
    }
}

/// One position and one speed sample, stamped with their capture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    position: GeoPosition,
    speed: SpeedSample,
    captured_at: Instant,
    /// Heading over ground in degrees [0, 360), when the source reports one.
    heading_deg: Option<f64>,
}

impl FlightState {
    /// Create a flight state captured now.
    pub fn new(position: GeoPosition, speed: SpeedSample) -> Self {
        Self::captured_at(position, speed, Instant::now())
    }

    /// Create a flight state with an explicit capture time.
    pub fn captured_at(position: GeoPosition, speed: SpeedSample, captured_at: Instant) -> Self {
        Self {
            position,
            speed,
            captured_at,
            heading_deg: None,
        }
    }

    /// Attach a reported heading.
    pub fn with_heading(mut self, heading_deg: Option<f64>) -> Self {
        self.heading_deg = heading_deg;
        self
    }

    pub fn position(&self) -> &GeoPosition {
        &self.position
    }

    pub fn speed(&self) -> &SpeedSample {
        &self.speed
    }

    pub fn capture_time(&self) -> Instant {
        self.captured_at
    }

    pub fn heading_deg(&self) -> Option<f64> {
        self.heading_deg
    }

    /// Age of the sample at `now`; zero if `now` precedes the capture.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.captured_at)
    }

    /// Whether the sample is still within `window` at `now`.
    pub fn is_fresh_at(&self, now: Instant, window: Duration) -> bool {
        self.age_at(now) < window
    }

    /// Whether the sample is within the default 5 s window right now.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now(), DEFAULT_FRESHNESS_WINDOW)
    }
}
