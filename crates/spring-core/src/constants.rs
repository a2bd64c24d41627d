/// Distance of a cell that no warping path reaches.
///
/// Never `<=` a finite threshold and always loses a strict minimum comparison
/// against any finite distance.
pub const UNREACHED_DISTANCE: f64 = f64::INFINITY;

/// Start cycle carried by cells that were never reached by a path.
pub const UNREACHED_CYCLE: u64 = u64::MAX;

/// Start timestamp carried by cells that were never reached by a path.
pub const UNREACHED_TIMESTAMP: &str = "";

/// Neutral element for the running maximum of a path.
pub const EMPTY_PATH_MAX: f64 = f64::NEG_INFINITY;

/// Neutral element for the running minimum of a path.
pub const EMPTY_PATH_MIN: f64 = f64::INFINITY;

/// Placeholder stored at index 0 of an aligned profile.
pub const PROFILE_SENTINEL: f64 = -1.0;
