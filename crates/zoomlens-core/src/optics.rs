//! Rectilinear lens conversions between field of view, focal length, and
//! sensor width.
//!
//! The three functions are algebraically consistent inverses of one another
//! for `fov` in (0, pi) and positive focal lengths. They are pure and do not
//! guard their domain; callers keep `fov` away from pi, where the focal
//! length diverges.
//!
//! Reference: <https://en.wikipedia.org/wiki/Focal_length>

/// Field of view (radians) seen through a lens of the given focal length.
pub fn fov_from_focal_length(sensor_width: f64, focal_length: f64) -> f64 {
    2.0 * f64::atan2(sensor_width, 2.0 * focal_length)
}

/// Focal length (meters) that produces the given field of view.
///
/// Derived from [`fov_from_focal_length`].
pub fn focal_length_from_fov(sensor_width: f64, fov: f64) -> f64 {
    sensor_width / (2.0 * (fov / 2.0).tan())
}

/// Sensor width (meters) implied by a focal length and field of view pair.
pub fn sensor_width_from_focal_length_and_fov(focal_length: f64, fov: f64) -> f64 {
    2.0 * (fov / 2.0).tan() * focal_length
}
