//! Places provider response types.
//!
//! Every provider response is wrapped in a `{"status": "...", ...}`
//! envelope. Individual place records are untrusted: any field may be
//! missing, so everything on [`RawPlaceResult`] is optional and results are
//! parsed one at a time so a single malformed entry cannot sink a page.

use serde::{Deserialize, Serialize};

/// Envelope for `nearbysearch` and `textsearch`.
#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub status: String,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Envelope for `details`.
#[derive(Debug, Deserialize)]
pub struct DetailsEnvelope {
    pub status: String,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// Envelope for the geocoding endpoint.
#[derive(Debug, Deserialize)]
pub struct GeocodeEnvelope {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub location: Option<LatLng>,
}

/// A single place as returned by the provider, before any filtering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlaceResult {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Short address, present on nearby-search results.
    #[serde(default)]
    pub vicinity: Option<String>,
    /// Full address, present on text-search and details results.
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    /// Kept opaque; callers only ever need `open_now` or the raw object.
    #[serde(default)]
    pub opening_hours: Option<serde_json::Value>,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl RawPlaceResult {
    /// Coordinates of the place, if the provider supplied them.
    #[must_use]
    pub fn location(&self) -> Option<LatLng> {
        self.geometry.as_ref().and_then(|g| g.location)
    }

    #[must_use]
    pub fn types(&self) -> &[String] {
        self.types.as_deref().unwrap_or_default()
    }

    /// `opening_hours.open_now`, when reported.
    #[must_use]
    pub fn open_now(&self) -> Option<bool> {
        self.opening_hours
            .as_ref()
            .and_then(|h| h.get("open_now"))
            .and_then(serde_json::Value::as_bool)
    }

    /// Best available address: vicinity first, then the formatted address.
    /// Empty strings count as missing.
    #[must_use]
    pub fn address(&self) -> &str {
        [self.vicinity.as_deref(), self.formatted_address.as_deref()]
            .into_iter()
            .flatten()
            .find(|a| !a.is_empty())
            .unwrap_or_default()
    }
}
