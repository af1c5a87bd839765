//! Geographic positions and great-circle geometry.
//!
//! `GeoPosition` is the validated input type for everything downstream: a
//! value that exists is inside the legal coordinate ranges. `geodesy` turns
//! two positions into a distance and an initial bearing.

mod geodesy;
mod types;

pub use geodesy::{distance_and_bearing, GeodesicVector, GeometryError, EARTH_RADIUS_M};
pub use types::{GeoPosition, ValidationError, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
