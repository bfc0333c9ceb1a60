//! Query-string validation for the nearby search.

use greens_core::Coordinates;
use serde::Deserialize;

pub(crate) const DEFAULT_RADIUS_M: f64 = 5_000.0;
pub(crate) const MIN_RADIUS_M: f64 = 100.0;
pub(crate) const MAX_RADIUS_M: f64 = 50_000.0;
pub(crate) const DEFAULT_LIMIT: usize = 50;
pub(crate) const MAX_LIMIT: usize = 100;

/// Raw query parameters, kept as strings so every problem can be reported
/// at once instead of failing on the first bad field.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub q: Option<String>,
    pub place: Option<String>,
    pub types: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A validated and normalized search request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchRequest {
    /// Present only when both `lat` and `lng` were supplied.
    pub coordinates: Option<Coordinates>,
    pub radius: f64,
    pub q: Option<String>,
    pub place: Option<String>,
    /// Lower-cased type tags; `None` when no filter was requested.
    pub types: Option<Vec<String>>,
    pub page: usize,
    pub limit: usize,
}

impl SearchRequest {
    /// Validates and normalizes raw parameters.
    ///
    /// Numeric values are clamped rather than rejected where a sensible
    /// bound exists (`radius`, `page`, `limit`); coordinates out of range are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns every validation message found.
    pub(crate) fn from_params(params: &SearchParams) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();

        let lat = parse_coordinate(params.lat.as_deref(), "lat", 90.0, &mut errors);
        let lng = parse_coordinate(params.lng.as_deref(), "lng", 180.0, &mut errors);

        let radius = match non_blank(params.radius.as_deref()) {
            None => DEFAULT_RADIUS_M,
            Some(raw) => match parse_finite(raw) {
                Some(v) => v.clamp(MIN_RADIUS_M, MAX_RADIUS_M),
                None => {
                    errors.push("radius must be a number".to_string());
                    DEFAULT_RADIUS_M
                }
            },
        };

        let page = match non_blank(params.page.as_deref()) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(v) => usize::try_from(v.max(1)).unwrap_or(usize::MAX),
                Err(_) => {
                    errors.push("page must be an integer".to_string());
                    1
                }
            },
        };

        let limit = match non_blank(params.limit.as_deref()) {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.parse::<i64>() {
                Ok(v) => usize::try_from(v.clamp(1, 100)).unwrap_or(MAX_LIMIT),
                Err(_) => {
                    errors.push("limit must be an integer".to_string());
                    DEFAULT_LIMIT
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let types = non_blank(params.types.as_deref())
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|t| !t.is_empty());

        Ok(Self {
            coordinates: lat.zip(lng).map(|(lat, lng)| Coordinates::new(lat, lng)),
            radius,
            q: non_blank(params.q.as_deref()).map(ToOwned::to_owned),
            place: non_blank(params.place.as_deref()).map(ToOwned::to_owned),
            types,
            page,
            limit,
        })
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_coordinate(
    raw: Option<&str>,
    name: &str,
    bound: f64,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let raw = non_blank(raw)?;
    match parse_finite(raw) {
        Some(v) if (-bound..=bound).contains(&v) => Some(v),
        Some(_) => {
            errors.push(format!("{name} must be between -{bound} and {bound}"));
            None
        }
        None => {
            errors.push(format!("{name} must be a number"));
            None
        }
    }
}
