//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;

use bombsight::controller::EngageError;
use bombsight::geo::GeoPosition;
use bombsight::solver::BombingSolution;
use bombsight::targets::TargetCatalog;

use crate::error::CliError;

/// Target selection: explicit coordinates or a catalog entry.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Target latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with = "target")]
    pub target_lat: Option<f64>,

    /// Target longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with = "target")]
    pub target_lon: Option<f64>,

    /// Target altitude in meters
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
    pub target_alt: f64,

    /// JSON target catalog to look up --target in
    #[arg(long, requires = "target")]
    pub targets: Option<PathBuf>,

    /// Target name from the catalog (case-insensitive)
    #[arg(long, requires = "targets")]
    pub target: Option<String>,
}

impl TargetArgs {
    /// Resolve to a label and a validated position.
    pub fn resolve(&self) -> Result<(String, GeoPosition), CliError> {
        if let (Some(path), Some(name)) = (&self.targets, &self.target) {
            let catalog = TargetCatalog::load(path)?;
            let entry = catalog.find(name)?;
            return Ok((entry.name.clone(), entry.position));
        }

        match (self.target_lat, self.target_lon) {
            (Some(lat), Some(lon)) => {
                let position = GeoPosition::new(lat, lon, self.target_alt)?;
                Ok((position.to_string(), position))
            }
            _ => Err(CliError::InvalidArgument(
                "specify --target-lat and --target-lon, or --targets FILE --target NAME"
                    .to_string(),
            )),
        }
    }
}

/// Legacy numeric code for a failed engagement, when the solver produced one.
pub fn failure_code(error: &EngageError) -> Option<u8> {
    match error {
        EngageError::Release(e) => Some(e.code()),
        _ => None,
    }
}

/// Multi-line human-readable summary of a solution.
pub fn describe_solution(solution: &BombingSolution) -> String {
    let d = &solution.diagnostics;
    let mut out = String::new();
    out.push_str(&format!(
        "  Release in:       {:.2} s\n",
        solution.release_countdown_s
    ));
    out.push_str(&format!(
        "  Standoff:         {:.1} m before target\n",
        solution.standoff_distance_m
    ));
    out.push_str(&format!(
        "  Time of flight:   {:.2} s (fall {:.2} s){}\n",
        solution.flight_time_s,
        d.fall_time_s,
        if d.degraded { " [degraded]" } else { "" }
    ));
    out.push_str(&format!(
        "  Target distance:  {:.1} m, bearing {:.1}°\n",
        d.target_distance_m, d.bearing_deg
    ));
    out.push_str(&format!(
        "  Release height:   {:.1} m above target\n",
        d.altitude_delta_m
    ));
    out.push_str(&format!(
        "  Wind:             {:.1} m/s at {:.0}° to track, effective {:.1} m/s",
        solution.wind_speed, d.wind_angle_deg, d.effective_velocity
    ));
    out
}

/// One-line countdown for the service loop.
pub fn countdown_line(solution: &BombingSolution) -> String {
    let prefix = if solution.release_within(0.5) {
        "RELEASE NOW"
    } else {
        "release in"
    };
    format!(
        "{} {:>7.2} s | standoff {:>7.1} m | distance {:>8.1} m | tof {:>5.2} s",
        prefix,
        solution.release_countdown_s,
        solution.standoff_distance_m,
        solution.target_distance_m(),
        solution.flight_time_s
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bombsight::solver::ReleaseError;

    fn write_catalog(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("targets.json");
        std::fs::write(
            &path,
            r#"{ "targets": [ { "name": "Range Alpha", "latitude": 22.3293,
                 "longitude": 114.1694, "altitude": 12.0, "description": "" } ] }"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_resolve_coordinates() {
        let args = TargetArgs {
            target_lat: Some(22.3293),
            target_lon: Some(114.1694),
            ..Default::default()
        };
        let (_, position) = args.resolve().unwrap();
        assert_eq!(position.latitude(), 22.3293);
        assert_eq!(position.altitude(), 0.0);
    }

    #[test]
    fn test_resolve_missing_coordinates() {
        let args = TargetArgs {
            target_lat: Some(22.3293),
            ..Default::default()
        };
        assert!(matches!(args.resolve(), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_resolve_invalid_coordinates() {
        let args = TargetArgs {
            target_lat: Some(91.0),
            target_lon: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(args.resolve(), Err(CliError::Validation(_))));
    }

    #[test]
    fn test_resolve_catalog_entry() {
        let dir = tempfile::tempdir().unwrap();
        let args = TargetArgs {
            targets: Some(write_catalog(&dir)),
            target: Some("range alpha".to_string()),
            ..Default::default()
        };
        let (label, position) = args.resolve().unwrap();
        assert_eq!(label, "Range Alpha");
        assert_eq!(position.altitude(), 12.0);
    }

    #[test]
    fn test_resolve_unknown_catalog_entry() {
        let dir = tempfile::tempdir().unwrap();
        let args = TargetArgs {
            targets: Some(write_catalog(&dir)),
            target: Some("bravo".to_string()),
            ..Default::default()
        };
        assert!(matches!(args.resolve(), Err(CliError::Targets(_))));
    }

    #[test]
    fn test_failure_code() {
        let err = EngageError::Release(ReleaseError::BelowMinimumAltitude {
            altitude_m: 10.0,
            minimum_m: 50.0,
        });
        assert_eq!(failure_code(&err), Some(1));
        let stale = EngageError::Stale {
            age: std::time::Duration::from_secs(6),
        };
        assert_eq!(failure_code(&stale), None);
    }
}
