//! Tire safety limits shared by classification, machine status and the
//! timeline telemetry filter.
//!
//! Pressure is in bar, speed in km/h. Every comparison against these values
//! is strict (`<` / `>`), so a reading exactly on a limit is not a breach.

/// Physical range accepted at ingestion.
pub const PRESSURE_MIN: f64 = 0.0;
pub const PRESSURE_MAX: f64 = 10.0;
pub const SPEED_MIN: f64 = 0.0;
pub const SPEED_MAX: f64 = 200.0;

/// Below this the tire is critically under-inflated.
pub const PRESSURE_CRITICAL_LOW: f64 = 2.0;
/// Below this the tire is under-inflated.
pub const PRESSURE_WARNING_LOW: f64 = 2.5;
/// Above this the tire is over-inflated.
pub const PRESSURE_WARNING_HIGH: f64 = 4.5;
/// Above this the tire is critically over-inflated.
pub const PRESSURE_CRITICAL_HIGH: f64 = 5.0;

pub const SPEED_WARNING: f64 = 60.0;
pub const SPEED_CRITICAL: f64 = 80.0;

/// True when the reading breaches any critical limit.
pub fn is_critical(pressure: f64, speed: f64) -> bool {
    pressure < PRESSURE_CRITICAL_LOW || pressure > PRESSURE_CRITICAL_HIGH || speed > SPEED_CRITICAL
}

/// True when the reading breaches any warning limit (critical included).
pub fn is_flagged(pressure: f64, speed: f64) -> bool {
    pressure_out_of_band(pressure) || speed > SPEED_WARNING
}

/// True when pressure is outside the `[2.5, 4.5]` operating band.
pub fn pressure_out_of_band(pressure: f64) -> bool {
    pressure < PRESSURE_WARNING_LOW || pressure > PRESSURE_WARNING_HIGH
}
