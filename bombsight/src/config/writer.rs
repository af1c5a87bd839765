//! INI serialization: `ConfigFile` → commented INI text.

use std::time::Duration;

use super::settings::ConfigFile;

fn secs(d: Duration) -> String {
    format!("{}", d.as_secs_f64())
}

/// Render a fully populated, commented configuration file.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let s = &config.solver;
    let b = &config.ballistics;
    let t = &config.telemetry;
    let c = &config.connection;
    let l = &config.logging;
    let alternatives = c
        .alternatives
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"[solver]
; Minimum platform altitude for a release solution (m)
min_release_height = {}
; Targets farther than this are refused (m)
max_target_range = {}
; Number of solver outcomes kept for audit
history_size = {}

[ballistics]
; Gravitational acceleration (m/s^2)
gravity = {}
; Multiplier approximating unmodeled drag
drag_multiplier = {}
; Longest acceptable payload time of flight (s)
max_flight_time = {}
; Reserved for a drag-integrated solver; not used by the closed-form model
max_iterations = {}
convergence_tolerance = {}
; Payload description (kg, dimensionless, m^2); reserved
payload_mass = {}
drag_coefficient = {}
cross_section = {}

[telemetry]
; Airspeed or groundspeed above this is rejected (m/s)
speed_ceiling = {}
; Per-message receive timeout (s)
message_timeout = {}
; Total budget for one position + speed pull (s)
flight_state_budget = {}
; Flight states at least this old are not solved (s)
freshness_window = {}

[connection]
; Targets: udp:<host>:<port> or a serial device path
primary = {}
; Space-separated fallbacks, tried in order
alternatives = {}
; Heartbeat silence before the link is degraded (s)
liveness_window = {}
; Budget per connection attempt, including the first heartbeat (s)
connect_timeout = {}
; Degraded checks in a row before the monitor reconnects
max_degraded_checks = {}
; Seconds between monitor checks
monitor_interval = {}
auto_reconnect = {}

[logging]
directory = {}
file = {}
debug = {}
"#,
        s.min_release_height_m,
        s.max_target_range_m,
        s.history_size,
        b.gravity,
        b.drag_multiplier,
        b.max_flight_time_s,
        b.max_iterations,
        b.convergence_tolerance,
        b.payload.mass_kg,
        b.payload.drag_coefficient,
        b.payload.cross_section_m2,
        t.speed_ceiling,
        secs(t.message_timeout),
        secs(t.flight_state_budget),
        secs(t.freshness_window),
        c.primary,
        alternatives,
        secs(c.liveness_window),
        secs(c.connect_timeout),
        c.max_degraded_checks,
        secs(c.monitor_interval),
        c.auto_reconnect,
        l.directory,
        l.file,
        l.debug,
    )
}
