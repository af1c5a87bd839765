//! Wind estimation from airspeed/groundspeed divergence.
//!
//! The shipped estimator is a two-state model: the whole difference between
//! airspeed and groundspeed is attributed to a pure headwind or a pure
//! tailwind. It is not a vector wind solve and ignores the flight bearing.
//! Alternative models plug in through `WindEstimator`.

use std::f64::consts::PI;

/// Wind magnitude and direction relative to the flight path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindEstimate {
    /// Wind speed magnitude (m/s).
    pub speed: f64,
    /// Angle between wind and track (radians): π = headwind, 0 = tailwind.
    pub relative_angle: f64,
}

impl WindEstimate {
    /// Calm air.
    pub const CALM: WindEstimate = WindEstimate {
        speed: 0.0,
        relative_angle: 0.0,
    };

    /// Along-track component: negative into a headwind, positive with a tailwind.
    pub fn along_track(&self) -> f64 {
        self.speed * self.relative_angle.cos()
    }

    pub fn is_headwind(&self) -> bool {
        self.along_track() < 0.0
    }
}

/// Derives a wind estimate from the current speed sample.
///
/// Implementations must not fail: a solver cycle always gets an estimate.
pub trait WindEstimator: Send + Sync {
    /// Estimate wind from validated airspeed and groundspeed (m/s) and the
    /// bearing to the target (radians).
    fn estimate(&self, airspeed: f64, groundspeed: f64, bearing_rad: f64) -> WindEstimate;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Headwind/tailwind classifier.
///
/// `speed = |airspeed - groundspeed|`; headwind when airspeed exceeds
/// groundspeed, tailwind otherwise. The bearing is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadTailWindEstimator;

impl WindEstimator for HeadTailWindEstimator {
    fn estimate(&self, airspeed: f64, groundspeed: f64, _bearing_rad: f64) -> WindEstimate {
        let speed = (airspeed - groundspeed).abs();
        let relative_angle = if airspeed > groundspeed { PI } else { 0.0 };
        WindEstimate {
            speed,
            relative_angle,
        }
    }

    fn name(&self) -> &'static str {
        "head/tail"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headwind() {
        let w = HeadTailWindEstimator.estimate(50.0, 45.0, 0.7);
        assert_eq!(w.speed, 5.0);
        assert_eq!(w.relative_angle, PI);
        assert!(w.is_headwind());
        assert!((w.along_track() + 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_tailwind() {
        let w = HeadTailWindEstimator.estimate(40.0, 48.0, 0.0);
        assert_eq!(w.speed, 8.0);
        assert_eq!(w.relative_angle, 0.0);
        assert!(!w.is_headwind());
        assert_eq!(w.along_track(), 8.0);
    }

    #[test]
    fn test_equal_speeds_is_calm_tailwind() {
        let w = HeadTailWindEstimator.estimate(45.0, 45.0, 1.0);
        assert_eq!(w, WindEstimate::CALM);
    }

    #[test]
    fn test_bearing_does_not_change_estimate() {
        let a = HeadTailWindEstimator.estimate(50.0, 45.0, 0.0);
        let b = HeadTailWindEstimator.estimate(50.0, 45.0, 2.5);
        assert_eq!(a, b);
    }
}
