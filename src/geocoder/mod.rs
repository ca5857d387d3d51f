mod geocoder_types;
mod nominatim;
mod postal_index;

pub use geocoder_types::{Coordinate, PlaceGeocoder, PostalGeocoder};
pub use nominatim::NominatimGeocoder;
pub use postal_index::load_postal_index;

#[cfg(test)]
pub use geocoder_types::GeocodeError;
#[cfg(test)]
pub use postal_index::PostalCodeIndex;
