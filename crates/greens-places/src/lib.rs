//! Gateway to the external places and geocoding provider.
//!
//! [`PlacesClient`] exposes the four provider operations the plant-shop
//! search needs (geocode, nearby search, text search, place details).
//! Every call is a single network request with no retry.

pub mod client;
pub mod error;
pub mod relevance;
pub mod types;

pub use client::{
    PlacesClient, PlacesConfig, DEFAULT_NEARBY_KEYWORD, MAX_SEARCH_RADIUS_M,
    TEXT_SEARCH_QUALIFIER,
};
pub use error::{PlacesError, PlacesErrorKind};
pub use relevance::is_plant_related;
pub use types::{LatLng, RawPlaceResult};
