// crates/carto-core/src/geocode/nominatim.rs

//! Nominatim (OpenStreetMap) wire format.
//!
//! The request is `GET {endpoint}?format=json&q={query}&limit={n}`; the
//! response is a JSON array of places whose `lat`/`lon` are decimal
//! **strings**.

use super::GeocodeRequest;

pub const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Query-string pairs of a search request.
pub fn query_pairs(request: &GeocodeRequest) -> Vec<(&'static str, String)> {
    vec![
        ("format", "json".to_owned()),
        ("q", request.scoped_query()),
        ("limit", request.limit.to_string()),
    ]
}

#[cfg(feature = "json")]
mod wire {
    use super::super::{GeocodeError, GeocodeHit, GeocodeResult};
    use serde::Deserialize;
    use tracing::debug;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Degrees {
        Text(String),
        Number(f64),
    }

    impl Degrees {
        fn value(&self) -> Option<f64> {
            match self {
                Degrees::Text(s) => s.trim().parse().ok(),
                Degrees::Number(n) => Some(*n),
            }
        }
    }

    #[derive(Deserialize)]
    struct Place {
        #[serde(default)]
        display_name: String,
        lat: Degrees,
        lon: Degrees,
    }

    /// Parses a search response body. Places with unreadable coordinates
    /// are skipped.
    pub fn parse_response(body: &str) -> GeocodeResult {
        let places: Vec<Place> =
            serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

        Ok(places
            .into_iter()
            .filter_map(|p| match (p.lon.value(), p.lat.value()) {
                (Some(lon), Some(lat)) => Some(GeocodeHit {
                    display_name: p.display_name,
                    lon,
                    lat,
                }),
                _ => {
                    debug!(place = %p.display_name, "skipping place without coordinates");
                    None
                }
            })
            .collect())
    }
}

#[cfg(feature = "json")]
pub use wire::parse_response;

#[cfg(feature = "http")]
pub use client::NominatimClient;

#[cfg(feature = "http")]
mod client {
    use super::super::{GeocodeError, Geocoder, GeocodeRequest, GeocodeResult};
    use super::{parse_response, query_pairs};
    use crate::config::SearchConfig;
    use tracing::debug;

    /// Blocking HTTP client for the CLI and native hosts.
    #[derive(Debug, Clone)]
    pub struct NominatimClient {
        http: reqwest::blocking::Client,
        endpoint: String,
    }

    impl NominatimClient {
        pub fn new(config: &SearchConfig) -> Result<Self, GeocodeError> {
            let http = reqwest::blocking::Client::builder()
                .user_agent(config.user_agent.as_str())
                .build()
                .map_err(|e| GeocodeError::Transport(e.to_string()))?;
            Ok(Self {
                http,
                endpoint: config.endpoint.clone(),
            })
        }
    }

    impl Geocoder for NominatimClient {
        fn lookup(&self, request: &GeocodeRequest) -> GeocodeResult {
            debug!(query = %request.query, generation = request.generation, "nominatim lookup");
            let response = self
                .http
                .get(&self.endpoint)
                .query(&query_pairs(request))
                .send()
                .map_err(|e| GeocodeError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(GeocodeError::Status(status.as_u16()));
            }

            let body = response
                .text()
                .map_err(|e| GeocodeError::Transport(e.to_string()))?;
            parse_response(&body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> GeocodeRequest {
        GeocodeRequest {
            generation: 1,
            query: query.to_owned(),
            country: Some("Maroc".to_owned()),
            limit: 5,
        }
    }

    #[test]
    fn query_is_scoped_to_the_country() {
        let pairs = query_pairs(&request("Rabat"));
        assert_eq!(
            pairs,
            vec![
                ("format", "json".to_owned()),
                ("q", "Rabat, Maroc".to_owned()),
                ("limit", "5".to_owned()),
            ]
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn string_coordinates_are_parsed() {
        let body = r#"[
            {"display_name": "Rabat, Maroc", "lat": "34.0209", "lon": "-6.8416"},
            {"display_name": "Salé", "lat": 34.05, "lon": -6.79},
            {"display_name": "Broken", "lat": "n/a", "lon": "-6.0"}
        ]"#;
        let hits = parse_response(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].display_name, "Rabat, Maroc");
        assert!((hits[0].lat - 34.0209).abs() < 1e-9);
        assert!((hits[1].lon + 6.79).abs() < 1e-9);
    }

    #[cfg(feature = "json")]
    #[test]
    fn non_array_bodies_are_parse_errors() {
        let err = parse_response(r#"{"error": "rate limited"}"#).unwrap_err();
        assert!(matches!(err, super::super::GeocodeError::Parse(_)));
    }
}
