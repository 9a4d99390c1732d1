// crates/carto-core/src/geocode/mod.rs

//! # Geocode Search
//!
//! Free-text place search feeding a suggestion list. Typing issues
//! requests; only the response to the **latest** request may populate the
//! suggestions. Every request carries a generation number and every
//! response must quote it back: anything older is dropped, so a slow "Rab"
//! can never overwrite the answer for "Raba".
//!
//! The session performs no I/O. It hands out [`GeocodeRequest`]s and the
//! host delivers the outcome through [`SearchSession::apply_response`],
//! either from a [`Geocoder`] implementation or from its own fetch.

use crate::config::SearchConfig;
use crate::geometry::LonLat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod debounce;
pub mod nominatim;

pub use debounce::Debounce;

/// One geocoder match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub display_name: String,
    pub lon: f64,
    pub lat: f64,
}

impl GeocodeHit {
    pub fn lon_lat(&self) -> LonLat {
        LonLat::new(self.lon, self.lat)
    }
}

/// A search to perform, tagged with the generation it answers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeocodeRequest {
    pub generation: u64,
    pub query: String,
    pub country: Option<String>,
    pub limit: usize,
}

impl GeocodeRequest {
    /// The text actually sent to the geocoder, e.g. `"Rabat, Maroc"`.
    pub fn scoped_query(&self) -> String {
        match self.country.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => format!("{}, {}", self.query, country),
            None => self.query.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("geocoder answered with HTTP {0}")]
    Status(u16),
    #[error("unreadable geocoder response: {0}")]
    Parse(String),
}

pub type GeocodeResult = Result<Vec<GeocodeHit>, GeocodeError>;

/// Anything that can resolve a [`GeocodeRequest`].
pub trait Geocoder {
    fn lookup(&self, request: &GeocodeRequest) -> GeocodeResult;
}

/// What a keystroke led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Query too short: suggestions cleared, nothing to send.
    Cleared,
    /// Waiting for the debounce window; see [`SearchSession::poll`].
    Deferred,
    /// The host should perform this request.
    Request(GeocodeRequest),
}

impl QueryOutcome {
    pub fn into_request(self) -> Option<GeocodeRequest> {
        match self {
            QueryOutcome::Request(r) => Some(r),
            _ => None,
        }
    }
}

/// What became of a delivered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Suggestions replaced with this many hits.
    Applied(usize),
    /// Superseded by a newer request; ignored.
    Stale,
    /// The request failed; previous suggestions are kept.
    Failed,
}

/// Snapshot for rendering the search box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchView {
    pub query: String,
    pub expanded: bool,
    pub loading: bool,
    pub suggestions: Vec<GeocodeHit>,
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    min_query_chars: usize,
    limit: usize,
    country: Option<String>,
    query: String,
    suggestions: Vec<GeocodeHit>,
    expanded: bool,
    generation: u64,
    in_flight: Option<u64>,
    debounce: Debounce,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl SearchSession {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            min_query_chars: config.min_query_chars,
            limit: config.result_limit,
            country: config.country.clone(),
            query: String::new(),
            suggestions: Vec::new(),
            expanded: false,
            generation: 0,
            in_flight: None,
            debounce: Debounce::new(config.debounce_ms),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[GeocodeHit] {
        &self.suggestions
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Generation of the request currently awaited, if any.
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Latest generation handed out (or invalidated).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> SearchView {
        SearchView {
            query: self.query.clone(),
            expanded: self.expanded,
            loading: self.in_flight.is_some() || self.debounce.pending().is_some(),
            suggestions: self.suggestions.clone(),
        }
    }

    pub fn expand(&mut self) {
        self.expanded = true;
    }

    /// Collapses the box and discards the whole session.
    pub fn collapse(&mut self) {
        self.expanded = false;
        self.clear();
    }

    /// Focus left the box: collapse only when nothing was typed.
    pub fn blur(&mut self) {
        if self.query.is_empty() {
            self.collapse();
        }
    }

    /// Handles a keystroke immediately, ignoring any debounce window.
    pub fn submit_query(&mut self, text: &str) -> QueryOutcome {
        self.query = text.to_owned();
        self.debounce.cancel();
        if self.is_too_short(text) {
            self.drop_results();
            return QueryOutcome::Cleared;
        }
        QueryOutcome::Request(self.issue(text))
    }

    /// Handles a keystroke typed at `now_ms`, honouring the debounce window.
    pub fn submit_query_at(&mut self, text: &str, now_ms: u64) -> QueryOutcome {
        if self.debounce.is_immediate() || self.is_too_short(text) {
            return self.submit_query(text);
        }
        self.query = text.to_owned();
        // A newer keystroke outdates whatever is in flight.
        if self.in_flight.take().is_some() {
            self.generation += 1;
        }
        self.debounce.defer(text, now_ms);
        QueryOutcome::Deferred
    }

    /// Releases a deferred request once its window has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<GeocodeRequest> {
        let text = self.debounce.ready(now_ms)?;
        Some(self.issue(&text))
    }

    /// Delivers the outcome of the request tagged `generation`.
    pub fn apply_response(&mut self, generation: u64, result: GeocodeResult) -> ResponseOutcome {
        if generation != self.generation || self.in_flight != Some(generation) {
            debug!(generation, latest = self.generation, "dropping stale geocode response");
            return ResponseOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(mut hits) => {
                hits.truncate(self.limit);
                let n = hits.len();
                self.suggestions = hits;
                ResponseOutcome::Applied(n)
            }
            Err(e) => {
                warn!(error = %e, query = %self.query, "geocode lookup failed");
                ResponseOutcome::Failed
            }
        }
    }

    /// Picks suggestion `index` and resets the session.
    pub fn take_suggestion(&mut self, index: usize) -> Option<GeocodeHit> {
        let hit = self.suggestions.get(index).cloned()?;
        self.collapse();
        Some(hit)
    }

    /// Clears query and suggestions and invalidates pending work.
    pub fn clear(&mut self) {
        self.query.clear();
        self.debounce.cancel();
        self.drop_results();
    }

    fn is_too_short(&self, text: &str) -> bool {
        text.chars().count() < self.min_query_chars
    }

    fn drop_results(&mut self) {
        self.suggestions.clear();
        self.in_flight = None;
        self.generation += 1;
    }

    fn issue(&mut self, text: &str) -> GeocodeRequest {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        GeocodeRequest {
            generation: self.generation,
            query: text.to_owned(),
            country: self.country.clone(),
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(n: usize) -> Vec<GeocodeHit> {
        (0..n)
            .map(|i| GeocodeHit {
                display_name: format!("Place {i}"),
                lon: -6.0 - i as f64,
                lat: 34.0,
            })
            .collect()
    }

    fn session(debounce_ms: u64) -> SearchSession {
        SearchSession::new(&SearchConfig {
            debounce_ms,
            ..SearchConfig::default()
        })
    }

    #[test]
    fn short_queries_never_reach_the_geocoder() {
        let mut s = session(0);
        assert_eq!(s.submit_query("Ra"), QueryOutcome::Cleared);
        assert_eq!(s.in_flight(), None);
        // Three scalar values, six bytes.
        assert!(matches!(s.submit_query("فاس"), QueryOutcome::Request(_)));
    }

    #[test]
    fn only_the_latest_generation_applies() {
        let mut s = session(0);
        let rab = s.submit_query("Rab").into_request().unwrap();
        let raba = s.submit_query("Raba").into_request().unwrap();
        assert!(raba.generation > rab.generation);

        assert_eq!(s.apply_response(rab.generation, Ok(hits(5))), ResponseOutcome::Stale);
        assert!(s.suggestions().is_empty());
        assert_eq!(s.apply_response(raba.generation, Ok(hits(2))), ResponseOutcome::Applied(2));
        assert_eq!(s.apply_response(raba.generation, Ok(hits(3))), ResponseOutcome::Stale);
    }

    #[test]
    fn shortening_the_query_supersedes_the_request() {
        let mut s = session(0);
        let req = s.submit_query("Fès-").into_request().unwrap();
        s.submit_query("Fè");
        assert_eq!(s.apply_response(req.generation, Ok(hits(1))), ResponseOutcome::Stale);
        assert!(s.suggestions().is_empty());
    }

    #[test]
    fn failures_keep_previous_suggestions() {
        let mut s = session(0);
        let first = s.submit_query("Rabat").into_request().unwrap();
        s.apply_response(first.generation, Ok(hits(3)));
        let second = s.submit_query("Rabat ").into_request().unwrap();
        let outcome = s.apply_response(second.generation, Err(GeocodeError::Status(503)));
        assert_eq!(outcome, ResponseOutcome::Failed);
        assert_eq!(s.suggestions().len(), 3);
        assert_eq!(s.query(), "Rabat ");
        assert_eq!(s.in_flight(), None);
    }

    #[test]
    fn responses_are_capped_at_the_limit() {
        let mut s = session(0);
        let req = s.submit_query("Casa").into_request().unwrap();
        assert_eq!(req.limit, 5);
        assert_eq!(req.scoped_query(), "Casa, Maroc");
        assert_eq!(s.apply_response(req.generation, Ok(hits(9))), ResponseOutcome::Applied(5));
    }

    #[test]
    fn taking_a_suggestion_resets_the_session() {
        let mut s = session(0);
        s.expand();
        let req = s.submit_query("Agadir").into_request().unwrap();
        s.apply_response(req.generation, Ok(hits(2)));
        let hit = s.take_suggestion(1).unwrap();
        assert_eq!(hit.display_name, "Place 1");
        assert_eq!(s.query(), "");
        assert!(s.suggestions().is_empty());
        assert!(!s.is_expanded());
        assert!(s.take_suggestion(0).is_none());
    }

    #[test]
    fn blur_collapses_only_an_empty_box() {
        let mut s = session(0);
        s.expand();
        s.submit_query("Tan");
        s.blur();
        assert!(s.is_expanded());
        s.submit_query("");
        s.blur();
        assert!(!s.is_expanded());
    }

    #[test]
    fn debounced_keystrokes_collapse_into_one_request() {
        let mut s = session(250);
        assert_eq!(s.submit_query_at("Mek", 0), QueryOutcome::Deferred);
        assert_eq!(s.submit_query_at("Mekn", 100), QueryOutcome::Deferred);
        assert_eq!(s.query(), "Mekn");
        assert!(s.poll(300).is_none());
        let req = s.poll(350).unwrap();
        assert_eq!(req.query, "Mekn");
        assert!(s.poll(1_000).is_none());
    }

    #[test]
    fn deferred_keystroke_outdates_the_request_in_flight() {
        let mut s = session(250);
        s.submit_query_at("Rab", 0);
        let rab = s.poll(250).unwrap();
        assert_eq!(s.submit_query_at("Raba", 300), QueryOutcome::Deferred);
        assert_eq!(s.in_flight(), None);

        assert_eq!(s.apply_response(rab.generation, Ok(hits(5))), ResponseOutcome::Stale);
        assert_eq!(s.query(), "Raba");
        assert!(s.suggestions().is_empty());

        let raba = s.poll(550).unwrap();
        assert!(raba.generation > rab.generation);
        assert_eq!(s.apply_response(raba.generation, Ok(hits(3))), ResponseOutcome::Applied(3));
    }

    #[test]
    fn deferred_keystroke_keeps_current_suggestions() {
        let mut s = session(250);
        s.submit_query_at("Tanger", 0);
        let req = s.poll(250).unwrap();
        s.apply_response(req.generation, Ok(hits(2)));
        s.submit_query_at("Tangers", 400);
        assert_eq!(s.suggestions().len(), 2);
        assert!(s.view().loading);
    }

    #[test]
    fn blur_keeps_a_whitespace_query_open() {
        let mut s = session(0);
        s.expand();
        s.submit_query("  ");
        s.blur();
        assert!(s.is_expanded());
    }

    #[test]
    fn short_input_cancels_a_deferred_request() {
        let mut s = session(250);
        s.submit_query_at("Oujda", 0);
        assert_eq!(s.submit_query_at("Ou", 10), QueryOutcome::Cleared);
        assert!(s.poll(1_000).is_none());
        assert!(!s.view().loading);
    }
}
