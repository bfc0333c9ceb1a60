//! HTTP client for the places and geocoding web services.
//!
//! Wraps `reqwest` with credential handling, envelope-status checks and lenient
//! per-entry response parsing. The client carries no
//! per-request state and is safe to share across concurrent requests.

use std::time::Duration;

use greens_core::{AppConfig, Coordinates};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::PlacesError;
use crate::types::{DetailsEnvelope, GeocodeEnvelope, RawPlaceResult, SearchEnvelope};

/// Keyword used for nearby searches when the caller supplies none.
pub const DEFAULT_NEARBY_KEYWORD: &str = "plant nursery garden center";

/// Appended to every free-text query to keep results in the plant domain.
pub const TEXT_SEARCH_QUALIFIER: &str = "plant shop garden center nursery";

/// Largest radius the provider accepts for a nearby search, in meters.
pub const MAX_SEARCH_RADIUS_M: f64 = 50_000.0;

const DETAILS_FIELDS: &str = "name,formatted_address,geometry,rating,types,opening_hours,formatted_phone_number,website,price_level";

/// Connection settings for [`PlacesClient`].
#[derive(Clone)]
pub struct PlacesConfig {
    pub api_key: Option<String>,
    pub places_base_url: String,
    pub geocode_base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl PlacesConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.places_api_key.clone(),
            places_base_url: config.places_base_url.clone(),
            geocode_base_url: config.geocode_base_url.clone(),
            timeout_secs: config.places_timeout_secs,
            user_agent: config.places_user_agent.clone(),
        }
    }
}

impl std::fmt::Debug for PlacesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacesConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("places_base_url", &self.places_base_url)
            .field("geocode_base_url", &self.geocode_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Client for the places provider.
///
/// Construct once at startup from a [`PlacesConfig`]; point the base URLs
/// at a mock server in tests.
pub struct PlacesClient {
    client: Client,
    api_key: Option<String>,
    places_base_url: Url,
    geocode_base_url: Url,
}

impl PlacesClient {
    /// Creates a client from explicit configuration.
    ///
    /// A missing API key is not an error here; each operation reports
    /// [`PlacesError::MissingApiKey`] instead, so the server can still boot
    /// and answer health checks.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`PlacesError::InvalidBaseUrl`] if either
    /// base URL does not parse.
    pub fn new(config: &PlacesConfig) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            places_base_url: parse_base_url(&config.places_base_url)?,
            geocode_base_url: parse_base_url(&config.geocode_base_url)?,
        })
    }

    /// Whether a provider credential is available.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Resolves a free-form place name ("Central Park", "Brooklyn") to
    /// coordinates, taking the provider's first match.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::MissingApiKey`] if no credential is configured.
    /// - [`PlacesError::NotFound`] if the provider reports any status other
    ///   than `OK`, or returns no usable location.
    /// - [`PlacesError::Http`] / [`PlacesError::UnexpectedStatus`] on
    ///   transport or HTTP failure.
    pub async fn geocode_place(&self, name: &str) -> Result<Coordinates, PlacesError> {
        let key = self.api_key()?;
        let url = Self::build_url(&self.geocode_base_url, "json", key, &[("address", name)]);
        let envelope: GeocodeEnvelope = self.request_json("geocode", url).await?;

        if envelope.status != "OK" {
            tracing::debug!(
                place = name,
                status = %envelope.status,
                message = envelope.error_message.as_deref().unwrap_or(""),
                "geocoding returned non-OK status"
            );
            return Err(PlacesError::NotFound {
                query: name.to_string(),
                status: envelope.status,
            });
        }

        envelope
            .results
            .into_iter()
            .find_map(|r| r.geometry.and_then(|g| g.location))
            .map(|loc| Coordinates::new(loc.lat, loc.lng))
            .ok_or_else(|| PlacesError::NotFound {
                query: name.to_string(),
                status: "ZERO_RESULTS".to_string(),
            })
    }

    /// Searches for stores around a point, filtered by `keyword`.
    ///
    /// The radius sent to the provider is capped at [`MAX_SEARCH_RADIUS_M`];
    /// a missing or blank keyword falls back to [`DEFAULT_NEARBY_KEYWORD`].
    ///
    /// # Errors
    ///
    /// - [`PlacesError::MissingApiKey`] if no credential is configured.
    /// - [`PlacesError::ApiStatus`] for any status other than `OK` or
    ///   `ZERO_RESULTS`.
    /// - [`PlacesError::Http`] / [`PlacesError::UnexpectedStatus`] /
    ///   [`PlacesError::Deserialize`] on transport or decoding failure.
    pub async fn nearby_search(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
        keyword: Option<&str>,
    ) -> Result<Vec<RawPlaceResult>, PlacesError> {
        let key = self.api_key()?;
        let location = format!("{lat},{lng}");
        let radius = radius_meters.min(MAX_SEARCH_RADIUS_M).to_string();
        let keyword = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_NEARBY_KEYWORD);

        let url = Self::build_url(
            &self.places_base_url,
            "nearbysearch/json",
            key,
            &[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("type", "store"),
                ("keyword", keyword),
            ],
        );
        let envelope: SearchEnvelope = self.request_json("nearbysearch", url).await?;
        Self::search_results("nearbysearch", envelope)
    }

    /// Free-text search, always qualified with [`TEXT_SEARCH_QUALIFIER`].
    ///
    /// Results are biased towards `location` when one is given; `radius`
    /// defaults to [`MAX_SEARCH_RADIUS_M`] in that case.
    ///
    /// # Errors
    ///
    /// Same as [`PlacesClient::nearby_search`].
    pub async fn text_search(
        &self,
        query: &str,
        location: Option<Coordinates>,
        radius_meters: Option<f64>,
    ) -> Result<Vec<RawPlaceResult>, PlacesError> {
        let key = self.api_key()?;
        let query = format!("{} {TEXT_SEARCH_QUALIFIER}", query.trim());
        let query = query.trim();

        let bias = location.map(|c| {
            (
                format!("{},{}", c.lat, c.lng),
                radius_meters.unwrap_or(MAX_SEARCH_RADIUS_M).to_string(),
            )
        });
        let mut params = vec![("query", query)];
        if let Some((loc, radius)) = &bias {
            params.push(("location", loc.as_str()));
            params.push(("radius", radius.as_str()));
        }

        let url = Self::build_url(&self.places_base_url, "textsearch/json", key, &params);
        let envelope: SearchEnvelope = self.request_json("textsearch", url).await?;
        Self::search_results("textsearch", envelope)
    }

    /// Fetches extended details for one place.
    ///
    /// Returns `Ok(None)` when the provider cannot resolve the id (any
    /// status other than `OK`).
    ///
    /// # Errors
    ///
    /// - [`PlacesError::MissingApiKey`] if no credential is configured.
    /// - [`PlacesError::Http`] / [`PlacesError::UnexpectedStatus`] /
    ///   [`PlacesError::Deserialize`] on transport or decoding failure.
    pub async fn get_place_details(
        &self,
        place_id: &str,
    ) -> Result<Option<RawPlaceResult>, PlacesError> {
        let key = self.api_key()?;
        let url = Self::build_url(
            &self.places_base_url,
            "details/json",
            key,
            &[("place_id", place_id), ("fields", DETAILS_FIELDS)],
        );
        let envelope: DetailsEnvelope = self.request_json("details", url).await?;

        if envelope.status != "OK" {
            tracing::debug!(place_id, status = %envelope.status, "place details unresolved");
            return Ok(None);
        }

        match envelope.result {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| PlacesError::Deserialize {
                    context: format!("details(place_id={place_id})"),
                    source: e,
                }),
            None => Ok(None),
        }
    }

    fn api_key(&self) -> Result<&str, PlacesError> {
        self.api_key.as_deref().ok_or(PlacesError::MissingApiKey)
    }

    /// Joins `path` onto `base` and appends percent-encoded query parameters,
    /// with the credential last.
    fn build_url(base: &Url, path: &str, key: &str, params: &[(&str, &str)]) -> Url {
        let mut url = base.join(path).unwrap_or_else(|_| base.clone());
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", key);
        }
        url
    }

    /// Sends a GET, requires a 2xx status, and parses the body.
    ///
    /// URLs are stripped from transport errors because they carry the key.
    async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Url,
    ) -> Result<T, PlacesError> {
        tracing::debug!(endpoint, "places provider request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlacesError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint,
            });
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        serde_json::from_str(&body).map_err(|e| PlacesError::Deserialize {
            context: endpoint.to_string(),
            source: e,
        })
    }

    /// Validates the envelope status and parses each result independently,
    /// skipping entries that do not deserialize.
    fn search_results(
        endpoint: &'static str,
        envelope: SearchEnvelope,
    ) -> Result<Vec<RawPlaceResult>, PlacesError> {
        match envelope.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            _ => {
                return Err(PlacesError::ApiStatus {
                    endpoint,
                    status: envelope.status,
                    message: envelope.error_message,
                })
            }
        }

        let total = envelope.results.len();
        let results: Vec<RawPlaceResult> = envelope
            .results
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();

        if results.len() < total {
            tracing::warn!(
                endpoint,
                skipped = total - results.len(),
                "skipped malformed place results"
            );
        }
        Ok(results)
    }
}

/// Ensures the base URL ends with exactly one slash so relative paths join
/// beneath it rather than replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url, PlacesError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| PlacesError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(places: &str, geocode: &str) -> PlacesConfig {
        PlacesConfig {
            api_key: Some("test-key".to_string()),
            places_base_url: places.to_string(),
            geocode_base_url: geocode.to_string(),
            timeout_secs: 5,
            user_agent: "greens-test".to_string(),
        }
    }

    #[test]
    fn build_url_appends_path_and_key_last() {
        let base = parse_base_url("https://maps.googleapis.com/maps/api/place").unwrap();
        let url = PlacesClient::build_url(&base, "details/json", "k", &[("place_id", "abc")]);
        assert_eq!(
            url.as_str(),
            "https://maps.googleapis.com/maps/api/place/details/json?place_id=abc&key=k"
        );
    }

    #[test]
    fn build_url_tolerates_trailing_slash() {
        let base = parse_base_url("https://maps.googleapis.com/maps/api/geocode/").unwrap();
        let url = PlacesClient::build_url(&base, "json", "k", &[("address", "Central Park")]);
        assert_eq!(
            url.as_str(),
            "https://maps.googleapis.com/maps/api/geocode/json?address=Central+Park&key=k"
        );
    }

    #[test]
    fn build_url_encodes_special_characters() {
        let base = parse_base_url("https://example.test/place").unwrap();
        let url = PlacesClient::build_url(&base, "textsearch/json", "k", &[("query", "roses & ferns")]);
        assert!(
            url.as_str().contains("roses+%26+ferns"),
            "query should be percent-encoded: {url}"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = test_config("not a url", "https://example.test/geocode");
        let err = PlacesClient::new(&config).err().expect("should fail");
        assert!(matches!(err, PlacesError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn config_debug_redacts_key() {
        let config = test_config("https://a.test", "https://b.test");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("test-key"));
    }

    #[test]
    fn search_results_rejects_error_status() {
        let envelope = SearchEnvelope {
            status: "OVER_QUERY_LIMIT".to_string(),
            results: vec![],
            error_message: Some("quota".to_string()),
        };
        let err = PlacesClient::search_results("nearbysearch", envelope).unwrap_err();
        assert!(matches!(err, PlacesError::ApiStatus { ref status, .. } if status == "OVER_QUERY_LIMIT"));
    }

    #[test]
    fn search_results_skips_malformed_entries() {
        let envelope = SearchEnvelope {
            status: "OK".to_string(),
            results: vec![
                serde_json::json!({ "name": "Good", "geometry": { "location": { "lat": 1.0, "lng": 2.0 } } }),
                serde_json::json!({ "name": 42 }),
            ],
            error_message: None,
        };
        let results = PlacesClient::search_results("textsearch", envelope).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name.as_deref(), Some("Good"));
    }
}
