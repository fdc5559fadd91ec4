//! Grid generation for area coverage
//!
//! This module enumerates the search points covering a circular area. The
//! sequence is deterministic: checkpoint batch offsets index into it, so the
//! same inputs must always yield the same points in the same order.
//!
//! Placement uses an equirectangular approximation. Latitude degrees are
//! treated as a constant 111.32 km; longitude degrees shrink with the cosine
//! of the center latitude.

mod point;

pub use point::GridPoint;

/// Meters per degree of latitude
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Generates the lattice of search points around a center
///
/// Points cover the bounding square of half-width `radius_km`, row-major
/// (latitude outer, longitude inner), starting at the south-west corner and
/// stepping by `spacing_m` meters until the north/east bound is reached.
/// Each dimension always contains at least one value, so a zero radius yields
/// the center point alone.
///
/// # Arguments
///
/// * `center_lat` - Latitude of the area center in degrees
/// * `center_lng` - Longitude of the area center in degrees
/// * `radius_km` - Half-width of the covered square in kilometers
/// * `spacing_m` - Distance between neighbouring points in meters
///
/// # Example
///
/// ```
/// use plan_ville::grid::generate_grid;
///
/// let points = generate_grid(40.7831, -73.9712, 1.0, 200.0);
/// assert_eq!(points, generate_grid(40.7831, -73.9712, 1.0, 200.0));
/// ```
pub fn generate_grid(
    center_lat: f64,
    center_lng: f64,
    radius_km: f64,
    spacing_m: f64,
) -> Vec<GridPoint> {
    let meridian_scale = center_lat.to_radians().cos();

    let lat_half_width = radius_km * 1000.0 / METERS_PER_DEGREE;
    let lng_half_width = radius_km * 1000.0 / (METERS_PER_DEGREE * meridian_scale);

    let lat_step = spacing_m / METERS_PER_DEGREE;
    let lng_step = spacing_m / (METERS_PER_DEGREE * meridian_scale);

    let latitudes = axis(center_lat - lat_half_width, center_lat + lat_half_width, lat_step);
    let longitudes = axis(center_lng - lng_half_width, center_lng + lng_half_width, lng_step);

    let mut points = Vec::with_capacity(latitudes.len() * longitudes.len());
    for &latitude in &latitudes {
        for &longitude in &longitudes {
            points.push(GridPoint::new(latitude, longitude));
        }
    }

    tracing::debug!(
        "Generated {} grid points ({} rows x {} columns)",
        points.len(),
        latitudes.len(),
        longitudes.len()
    );

    points
}

/// Values `start + i * step` for `i` in `0..ceil((end - start) / step)`, at least one
///
/// Each value is computed from its index rather than accumulated so that
/// rounding error does not drift along the axis.
fn axis(start: f64, end: f64, step: f64) -> Vec<f64> {
    let span = end - start;
    let count = if step > 0.0 && span > 0.0 {
        ((span / step).ceil() as usize).max(1)
    } else {
        1
    };

    (0..count).map(|i| start + i as f64 * step).collect()
}
