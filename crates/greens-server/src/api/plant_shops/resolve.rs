//! Decides where a search is centred and which provider call answers it.

use std::sync::LazyLock;

use greens_core::Coordinates;
use greens_places::{PlacesClient, PlacesError, RawPlaceResult, DEFAULT_NEARBY_KEYWORD};
use regex::Regex;
use serde::Serialize;

use super::params::SearchRequest;
use super::SearchError;

static PROXIMITY_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)near|close to").expect("static regex is valid"));

/// How the request asks for its origin. Resolved once per request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OriginQuery<'a> {
    Coordinates(Coordinates),
    PlaceName(&'a str),
    Invalid,
}

impl<'a> OriginQuery<'a> {
    pub(crate) fn from_request(req: &'a SearchRequest) -> Self {
        match (req.coordinates, req.place.as_deref()) {
            (Some(coords), _) => OriginQuery::Coordinates(coords),
            (None, Some(place)) => OriginQuery::PlaceName(place),
            (None, None) => OriginQuery::Invalid,
        }
    }
}

/// The point results are measured from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchOrigin {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_from: Option<String>,
}

impl SearchOrigin {
    pub(crate) fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Which provider operation serves the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SearchMode {
    /// Free-text search biased towards the origin.
    Text { query: String },
    /// Nearby search with a caller-derived keyword.
    Keyword { keyword: String },
    /// Nearby search with the provider default keyword.
    General,
}

impl SearchMode {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            SearchMode::Text { .. } => "text",
            SearchMode::Keyword { .. } => "keyword",
            SearchMode::General => "general",
        }
    }
}

/// Picks the provider call for a request.
///
/// Proximity phrasing in `q` ("near", "close to") or a supplied place name
/// selects a text search with those phrases removed. Any other `q` becomes
/// a nearby-search keyword; no `q` at all is a general plant-shop search.
pub(crate) fn select_mode(req: &SearchRequest) -> SearchMode {
    let q = req.q.as_deref().unwrap_or_default();
    let proximity = q.contains("near") || q.contains("close to");

    if proximity || req.place.is_some() {
        let query = PROXIMITY_PHRASE.replace_all(q, "").trim().to_string();
        SearchMode::Text { query }
    } else if !q.is_empty() {
        SearchMode::Keyword {
            keyword: format!("{DEFAULT_NEARBY_KEYWORD} {q}"),
        }
    } else {
        SearchMode::General
    }
}

/// Resolves the search origin, geocoding a place name when no coordinates
/// were supplied.
///
/// # Errors
///
/// - [`SearchError::MissingOrigin`] when neither coordinates nor a place
///   name were given; no provider call is made.
/// - [`SearchError::PlaceNotResolved`] when geocoding fails for any reason
///   other than a missing credential.
/// - [`SearchError::Places`] for a missing credential.
pub(crate) async fn resolve_origin(
    places: &PlacesClient,
    req: &SearchRequest,
) -> Result<SearchOrigin, SearchError> {
    match OriginQuery::from_request(req) {
        OriginQuery::Coordinates(c) => Ok(SearchOrigin {
            lat: c.lat,
            lng: c.lng,
            resolved_from: None,
        }),
        OriginQuery::PlaceName(place) => match places.geocode_place(place).await {
            Ok(c) => {
                tracing::debug!(place, lat = c.lat, lng = c.lng, "geocoded search origin");
                Ok(SearchOrigin {
                    lat: c.lat,
                    lng: c.lng,
                    resolved_from: Some(place.to_string()),
                })
            }
            Err(e @ PlacesError::MissingApiKey) => Err(SearchError::Places(e)),
            Err(e) => {
                tracing::info!(place, error = %e, "could not geocode place");
                Err(SearchError::PlaceNotResolved {
                    place: place.to_string(),
                    source: e,
                })
            }
        },
        OriginQuery::Invalid => Err(SearchError::MissingOrigin),
    }
}

/// Issues exactly one provider search for `mode` around `origin`.
///
/// # Errors
///
/// Returns [`SearchError::Places`] on any provider failure.
pub(crate) async fn run_search(
    places: &PlacesClient,
    mode: &SearchMode,
    origin: &SearchOrigin,
    radius: f64,
) -> Result<Vec<RawPlaceResult>, SearchError> {
    let results = match mode {
        SearchMode::Text { query } => {
            places
                .text_search(query, Some(origin.coordinates()), Some(radius))
                .await
        }
        SearchMode::Keyword { keyword } => {
            places
                .nearby_search(origin.lat, origin.lng, radius, Some(keyword))
                .await
        }
        SearchMode::General => {
            places
                .nearby_search(origin.lat, origin.lng, radius, None)
                .await
        }
    };
    results.map_err(SearchError::Places)
}
