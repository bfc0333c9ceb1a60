//! Plant-shop search and detail endpoints.

mod params;
mod process;
mod resolve;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use greens_core::Environment;
use greens_places::{PlacesError, PlacesErrorKind};
use serde::Serialize;

use crate::middleware::RequestId;

use self::params::{SearchParams, SearchRequest};
use self::process::{process_results, PageOptions, ShopRecord};
use self::resolve::{resolve_origin, run_search, select_mode, SearchOrigin};
use super::{internal_message, ApiError, AppState};

const SEARCH_CACHE_CONTROL: &str = "public, max-age=300";

/// Everything that can stop a search before a page is produced.
#[derive(Debug)]
pub(crate) enum SearchError {
    Validation(Vec<String>),
    MissingOrigin,
    PlaceNotResolved { place: String, source: PlacesError },
    Places(PlacesError),
}

impl SearchError {
    fn into_api_error(self, req_id: &RequestId, env: Environment) -> ApiError {
        match self {
            SearchError::Validation(details) => {
                ApiError::new("validation_error", "Invalid query parameters").with_details(details)
            }
            SearchError::MissingOrigin => ApiError::new(
                "bad_request",
                "Either coordinates (lat, lng) or place name is required",
            )
            .with_suggestion("Try: ?lat=40.7829&lng=-73.9654&q=succulents for Central Park area"),
            SearchError::PlaceNotResolved { place, source } => {
                ApiError::new("bad_request", format!("Could not find location: {place}"))
                    .with_message(source.to_string())
                    .with_suggestion(
                        "Try providing latitude and longitude coordinates instead, \
                         or enable the Geocoding API for your provider key",
                    )
            }
            SearchError::Places(e) => places_error(e, req_id, env, "Failed to fetch plant shops"),
        }
    }
}

/// Maps a provider failure to the API's error taxonomy.
fn places_error(e: PlacesError, req_id: &RequestId, env: Environment, what: &str) -> ApiError {
    match e.kind() {
        PlacesErrorKind::Config => {
            tracing::warn!(request_id = %req_id.0, "places API key not configured");
            ApiError::new("config_error", "Google Maps API key not configured")
                .with_message("Please set GOOGLE_MAPS_API_KEY in your environment variables")
        }
        PlacesErrorKind::NotFound | PlacesErrorKind::Upstream => {
            tracing::error!(request_id = %req_id.0, error = %e, "places provider call failed");
            ApiError::new("upstream_error", what).with_message(internal_message(env, &e))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchSummary {
    total: usize,
    page: usize,
    limit: usize,
    pages: usize,
    search_location: SearchOrigin,
    radius_meters: f64,
    search_query: Option<String>,
    resolved_place: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    success: bool,
    summary: SearchSummary,
    features: Vec<ShopRecord>,
}

pub(super) async fn nearby_plant_shops(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    search(&state, &params)
        .await
        .map_err(|e| e.into_api_error(&req_id, state.env))
}

async fn search(state: &AppState, params: &SearchParams) -> Result<Response, SearchError> {
    let req = SearchRequest::from_params(params).map_err(SearchError::Validation)?;

    if !state.places.has_api_key() {
        return Err(SearchError::Places(PlacesError::MissingApiKey));
    }

    let origin = resolve_origin(&state.places, &req).await?;
    let mode = select_mode(&req);
    tracing::info!(
        mode = mode.label(),
        lat = origin.lat,
        lng = origin.lng,
        radius = req.radius,
        "searching plant shops"
    );

    let raw = run_search(&state.places, &mode, &origin, req.radius).await?;
    let had_results = !raw.is_empty();

    let page = process_results(
        raw,
        PageOptions {
            origin: origin.coordinates(),
            radius: req.radius,
            // Any `q`, however short, bypasses the relevance heuristic.
            apply_relevance: req.q.is_none(),
            types: req.types.as_deref(),
            page: req.page,
            limit: req.limit,
        },
    );
    tracing::debug!(total = page.total, pages = page.pages, "plant shop search complete");

    let body = Json(SearchResponse {
        success: true,
        summary: SearchSummary {
            total: page.total,
            page: req.page,
            limit: req.limit,
            pages: page.pages,
            search_location: origin,
            radius_meters: req.radius,
            search_query: req.q,
            resolved_place: req.place,
        },
        features: page.features,
    });

    if had_results {
        Ok(([(header::CACHE_CONTROL, SEARCH_CACHE_CONTROL)], body).into_response())
    } else {
        Ok(body.into_response())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShopDetails {
    id: Option<String>,
    name: Option<String>,
    address: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    rating: Option<f64>,
    types: Vec<String>,
    phone: Option<String>,
    website: Option<String>,
    price_level: Option<u8>,
    opening_hours: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct ShopDetailsResponse {
    success: bool,
    shop: ShopDetails,
}

pub(super) async fn plant_shop_details(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(place_id): Path<String>,
) -> Result<Json<ShopDetailsResponse>, ApiError> {
    let place_id = place_id.trim();
    if place_id.is_empty() {
        return Err(ApiError::new("bad_request", "Place ID is required"));
    }

    let details = state
        .places
        .get_place_details(place_id)
        .await
        .map_err(|e| places_error(e, &req_id, state.env, "Failed to fetch shop details"))?
        .ok_or_else(|| ApiError::new("not_found", "Plant shop not found"))?;

    let location = details.location();
    Ok(Json(ShopDetailsResponse {
        success: true,
        shop: ShopDetails {
            id: details.place_id.or_else(|| Some(place_id.to_string())),
            name: details.name,
            address: details.formatted_address,
            lat: location.map(|l| l.lat),
            lng: location.map(|l| l.lng),
            rating: details.rating,
            types: details.types.unwrap_or_default(),
            phone: details.formatted_phone_number,
            website: details.website,
            price_level: details.price_level,
            opening_hours: details.opening_hours,
        },
    }))
}
