use super::cli_utils;
use super::extractor::LocationSet;
use super::geocoder::{Coordinate, PlaceGeocoder};

use geo::GeodesicDistance;
use log::{info, warn};

use std::collections::BTreeMap;

const METERS_PER_MILE: f64 = 1609.344;

/// Location string → miles from home. `None` when the location couldn't be
/// geocoded.
pub type DistanceMap = BTreeMap<String, Option<f64>>;

/// Shortest distance on the WGS-84 ellipsoid (Karney's geodesic), in miles.
/// Converges for every pair, including equatorial and antipodal points.
pub fn geodesic_miles(from: &Coordinate, to: &Coordinate) -> f64 {
    from.to_point().geodesic_distance(&to.to_point()) / METERS_PER_MILE
}

/// Geocodes every location once and measures it against `home`.
/// Lookup failures are logged and recorded as `None`.
pub fn build_distance_map(
    home: &Coordinate,
    locations: &LocationSet,
    geocoder: &dyn PlaceGeocoder,
    quiet_mode: bool,
) -> DistanceMap {
    let progress_bar = cli_utils::create_progress_bar_count(
        quiet_mode,
        "Geocoding locations...",
        Some(locations.len() as u64),
    );

    let mut distances = DistanceMap::new();
    let mut unresolved = 0;

    for location in locations {
        let distance = match geocoder.locate_place(location) {
            Ok(Some(coordinate)) => Some(geodesic_miles(&coordinate, home)),
            Ok(None) => {
                warn!("No coordinates found for '{}'", location);
                None
            }
            Err(err) => {
                warn!("{}", err);
                None
            }
        };

        if distance.is_none() {
            unresolved += 1;
        }
        distances.insert(location.clone(), distance);
        progress_bar.inc(1);
    }

    progress_bar.finish_and_clear();
    info!(
        "Found distances from home for {} locations ({} unresolved)",
        distances.len() - unresolved,
        unresolved
    );

    distances
}
