use super::geocoder_types::{Coordinate, GeocodeError, PlaceGeocoder};

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use serde::Deserialize;

use std::thread;
use std::time::Duration;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Free text geocoding through a Nominatim `/search` endpoint.
///
/// Requests are spaced at least `min_interval` apart; a zero interval
/// disables the limiter.
pub struct NominatimGeocoder {
    agent: ureq::Agent,
    endpoint: String,
    limiter: Option<DirectRateLimiter>,
    clock: DefaultClock,
}

impl NominatimGeocoder {
    pub fn new(agent: ureq::Agent, endpoint: &str, min_interval: Duration) -> NominatimGeocoder {
        NominatimGeocoder {
            agent,
            endpoint: endpoint.to_owned(),
            limiter: Quota::with_period(min_interval).map(RateLimiter::direct),
            clock: DefaultClock::default(),
        }
    }

    /// Blocks until the limiter grants the next request.
    fn wait_for_permit(&self) {
        if let Some(limiter) = &self.limiter {
            while let Err(not_until) = limiter.check() {
                thread::sleep(not_until.wait_time_from(self.clock.now()));
            }
        }
    }
}

// "NaN" and "inf" parse as f64 but are not coordinates.
fn parse_finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_search_response(query: &str, body: &str) -> Result<Option<Coordinate>, GeocodeError> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body).map_err(|err| GeocodeError::Response {
        query: query.to_owned(),
        reason: err.to_string(),
    })?;

    let place = match places.first() {
        Some(place) => place,
        None => return Ok(None),
    };

    let invalid = |what: &str, value: &str| GeocodeError::Response {
        query: query.to_owned(),
        reason: format!("invalid {} '{}'", what, value),
    };
    let latitude = parse_finite(&place.lat).ok_or_else(|| invalid("latitude", &place.lat))?;
    let longitude = parse_finite(&place.lon).ok_or_else(|| invalid("longitude", &place.lon))?;

    debug!("'{}' → {} ({}, {})", query, place.display_name, latitude, longitude);

    Ok(Some(Coordinate::new(latitude, longitude)))
}

impl PlaceGeocoder for NominatimGeocoder {
    fn locate_place(&self, place: &str) -> Result<Option<Coordinate>, GeocodeError> {
        self.wait_for_permit();

        let request_error = |reason: String| GeocodeError::Request {
            query: place.to_owned(),
            reason,
        };

        let response = self
            .agent
            .get(&self.endpoint)
            .query("q", place)
            .query("format", "json")
            .query("limit", "1")
            .call()
            .map_err(|err| request_error(err.to_string()))?;

        let body = response
            .into_string()
            .map_err(|err| request_error(err.to_string()))?;

        parse_search_response(place, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;
    use assert_matches::assert_matches;
    use std::time::Instant;

    const REDWOOD_CITY_RESPONSE: &str = r#"[{"place_id":297166453,"licence":"Data © OpenStreetMap contributors, ODbL 1.0.","osm_type":"relation","osm_id":2647583,"lat":"37.4863239","lon":"-122.232523","class":"boundary","type":"administrative","place_rank":16,"importance":0.62,"addresstype":"city","name":"Redwood City","display_name":"Redwood City, San Mateo County, California, United States","boundingbox":["37.4465060","37.5501680","-122.2940520","-122.1755800"]}]"#;

    #[test]
    fn it_should_parse_the_first_match() {
        let coordinate = parse_search_response("Redwood City, CA", REDWOOD_CITY_RESPONSE).unwrap();

        assert_eq!(coordinate, Some(Coordinate::new(37.4863239, -122.232523)));
    }

    #[test]
    fn it_should_return_none_for_an_empty_result() {
        assert_eq!(parse_search_response("Nowhere, XX", "[]").unwrap(), None);
    }

    #[test]
    fn it_should_fail_on_malformed_json() {
        assert_matches!(
            parse_search_response("Hayward, CA", "<html>rate limited</html>"),
            Err(GeocodeError::Response { .. })
        );
    }

    #[test]
    fn it_should_fail_on_a_non_numeric_coordinate() {
        assert_matches!(
            parse_search_response("Hayward, CA", r#"[{"lat":"north","lon":"-122.1"}]"#),
            Err(GeocodeError::Response { .. })
        );
    }

    #[test]
    fn it_should_send_the_place_as_a_search_query() {
        let (base_url, requests) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 37\r\nConnection: close\r\n\r\n[{\"lat\":\"37.8313\",\"lon\":\"-122.2852\"}]",
        );
        let geocoder = NominatimGeocoder::new(
            ureq::AgentBuilder::new().timeout(Duration::from_secs(5)).build(),
            &format!("{}/search", base_url),
            Duration::from_millis(0),
        );

        let coordinate = geocoder.locate_place("Emeryville, CA").unwrap();

        assert_eq!(coordinate, Some(Coordinate::new(37.8313, -122.2852)));
        let request = requests.recv().unwrap();
        assert!(request.starts_with("GET /search?q=Emeryville%2C+CA&format=json&limit=1 "));
    }

    #[test]
    fn it_should_report_a_server_error_as_a_request_error() {
        let (base_url, _requests) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let geocoder = NominatimGeocoder::new(
            ureq::AgentBuilder::new().timeout(Duration::from_secs(5)).build(),
            &format!("{}/search", base_url),
            Duration::from_millis(0),
        );

        assert_matches!(geocoder.locate_place("Hayward, CA"), Err(GeocodeError::Request { .. }));
    }

    #[test]
    fn it_should_reject_non_finite_coordinates() {
        assert_matches!(
            parse_search_response("Hayward, CA", r#"[{"lat":"NaN","lon":"-122.1"}]"#),
            Err(GeocodeError::Response { .. })
        );
        assert_matches!(
            parse_search_response("Hayward, CA", r#"[{"lat":"37.6","lon":"inf"}]"#),
            Err(GeocodeError::Response { .. })
        );
    }

    #[test]
    fn it_should_space_consecutive_requests() {
        let geocoder = NominatimGeocoder::new(
            ureq::AgentBuilder::new().build(),
            "http://127.0.0.1:9/search",
            Duration::from_millis(150),
        );

        let start = Instant::now();
        geocoder.wait_for_permit();
        geocoder.wait_for_permit();
        geocoder.wait_for_permit();

        assert!(start.elapsed() >= Duration::from_millis(290), "took {:?}", start.elapsed());
    }

    #[test]
    fn it_should_not_throttle_with_a_zero_interval() {
        let geocoder = NominatimGeocoder::new(
            ureq::AgentBuilder::new().build(),
            "http://127.0.0.1:9/search",
            Duration::from_millis(0),
        );

        assert!(geocoder.limiter.is_none());
        let start = Instant::now();
        for _ in 0..100 {
            geocoder.wait_for_permit();
        }

        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
