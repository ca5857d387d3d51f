use failure::Fail;
use geo_types::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate { latitude, longitude }
    }

    /// geo points are (x, y), i.e. (longitude, latitude).
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

#[derive(Debug, Fail)]
pub enum GeocodeError {
    #[fail(display = "Invalid postal code: '{}'", _0)]
    InvalidPostalCode(String),
    #[fail(display = "Geocoding request for '{}' failed: {}", query, reason)]
    Request { query: String, reason: String },
    #[fail(display = "Unexpected geocoding response for '{}': {}", query, reason)]
    Response { query: String, reason: String },
}

/// Postal code → coordinate. `Ok(None)` means the code is unknown or has no
/// coordinates in the dataset.
pub trait PostalGeocoder {
    fn locate_postal_code(&self, code: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

/// Free text place name → coordinate. `Ok(None)` means no match.
pub trait PlaceGeocoder {
    fn locate_place(&self, place: &str) -> Result<Option<Coordinate>, GeocodeError>;
}
