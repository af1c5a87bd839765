//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names map to settings fields.

use std::time::Duration;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::solver::{PayloadProfile, MAX_HISTORY_SIZE};
use crate::telemetry::ConnectionTarget;

/// Parse an `Ini` into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values present.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(s) = ini.section(Some("solver")) {
        let r = Reader::new("solver", s);
        r.positive("min_release_height", &mut config.solver.min_release_height_m)?;
        r.positive("max_target_range", &mut config.solver.max_target_range_m)?;
        if let Some(n) = r.count("history_size")? {
            if n as usize > MAX_HISTORY_SIZE {
                return Err(r.invalid(
                    "history_size",
                    &n.to_string(),
                    "must not exceed 10000 records",
                ));
            }
            config.solver.history_size = n as usize;
        }
    }

    if let Some(s) = ini.section(Some("ballistics")) {
        let r = Reader::new("ballistics", s);
        let b = &mut config.ballistics;
        r.positive("gravity", &mut b.gravity)?;
        r.positive("drag_multiplier", &mut b.drag_multiplier)?;
        r.positive("max_flight_time", &mut b.max_flight_time_s)?;
        if let Some(n) = r.count("max_iterations")? {
            b.max_iterations = n;
        }
        r.positive("convergence_tolerance", &mut b.convergence_tolerance)?;

        let mut mass = b.payload.mass_kg;
        let mut cd = b.payload.drag_coefficient;
        let mut area = b.payload.cross_section_m2;
        r.positive("payload_mass", &mut mass)?;
        r.positive("drag_coefficient", &mut cd)?;
        r.positive("cross_section", &mut area)?;
        b.payload =
            PayloadProfile::new(mass, cd, area).map_err(|e| ConfigFileError::InvalidValue {
                section: "ballistics".to_string(),
                key: "payload".to_string(),
                value: format!("{}/{}/{}", mass, cd, area),
                reason: e.to_string(),
            })?;
    }

    if let Some(s) = ini.section(Some("telemetry")) {
        let r = Reader::new("telemetry", s);
        let t = &mut config.telemetry;
        r.positive("speed_ceiling", &mut t.speed_ceiling)?;
        r.seconds("message_timeout", &mut t.message_timeout)?;
        r.seconds("flight_state_budget", &mut t.flight_state_budget)?;
        r.seconds("freshness_window", &mut t.freshness_window)?;
    }

    if let Some(s) = ini.section(Some("connection")) {
        let r = Reader::new("connection", s);
        let c = &mut config.connection;
        if let Some(v) = r.get("primary") {
            c.primary = r.target("primary", v)?;
        }
        // Present but empty means "no fallbacks".
        if let Some(v) = s.get("alternatives") {
            c.alternatives = v
                .split_whitespace()
                .map(|t| r.target("alternatives", t))
                .collect::<Result<_, _>>()?;
        }
        r.seconds("liveness_window", &mut c.liveness_window)?;
        r.seconds("connect_timeout", &mut c.connect_timeout)?;
        if let Some(n) = r.count("max_degraded_checks")? {
            c.max_degraded_checks = n;
        }
        r.seconds("monitor_interval", &mut c.monitor_interval)?;
        if let Some(b) = r.boolean("auto_reconnect")? {
            c.auto_reconnect = b;
        }
    }

    if let Some(s) = ini.section(Some("logging")) {
        let r = Reader::new("logging", s);
        if let Some(v) = r.get("directory") {
            config.logging.directory = v.to_string();
        }
        if let Some(v) = r.get("file") {
            config.logging.file = v.to_string();
        }
        if let Some(b) = r.boolean("debug")? {
            config.logging.debug = b;
        }
    }

    Ok(config)
}

/// Typed access to one section. Empty values count as absent.
struct Reader<'a> {
    section: &'static str,
    props: &'a Properties,
}

impl<'a> Reader<'a> {
    fn new(section: &'static str, props: &'a Properties) -> Self {
        Self { section, props }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.props
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn positive(&self, key: &str, slot: &mut f64) -> Result<(), ConfigFileError> {
        if let Some(v) = self.get(key) {
            match v.parse::<f64>() {
                Ok(n) if n.is_finite() && n > 0.0 => *slot = n,
                _ => return Err(self.invalid(key, v, "must be a positive number")),
            }
        }
        Ok(())
    }

    fn seconds(&self, key: &str, slot: &mut Duration) -> Result<(), ConfigFileError> {
        if let Some(v) = self.get(key) {
            match v.parse::<f64>() {
                Ok(n) if n.is_finite() && n > 0.0 && n <= 86_400.0 => {
                    *slot = Duration::from_secs_f64(n)
                }
                _ => return Err(self.invalid(key, v, "must be a positive number of seconds")),
            }
        }
        Ok(())
    }

    fn count(&self, key: &str) -> Result<Option<u32>, ConfigFileError> {
        self.get(key)
            .map(|v| {
                v.parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| self.invalid(key, v, "must be a positive integer"))
            })
            .transpose()
    }

    fn boolean(&self, key: &str) -> Result<Option<bool>, ConfigFileError> {
        self.get(key)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(self.invalid(key, v, "must be true or false")),
            })
            .transpose()
    }

    fn target(&self, key: &str, v: &str) -> Result<ConnectionTarget, ConfigFileError> {
        v.parse()
            .map_err(|e: crate::telemetry::TargetParseError| self.invalid(key, v, &e.reason))
    }
}
