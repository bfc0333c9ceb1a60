//! Turns raw provider results into a ranked, paginated page of shops.

use greens_core::Coordinates;
use greens_places::{is_plant_related, RawPlaceResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShopRecord {
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub rating: Option<f64>,
    pub types: Vec<String>,
    pub distance_meters: u64,
    pub price_level: Option<u8>,
    pub is_open: Option<bool>,
    pub place_id: Option<String>,
}

/// Inputs that shape one page of results.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageOptions<'a> {
    pub origin: Coordinates,
    pub radius: f64,
    /// Whether to run the plant-relevance heuristic over raw results.
    pub apply_relevance: bool,
    pub types: Option<&'a [String]>,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProcessedPage {
    /// Matching shops across all pages.
    pub total: usize,
    pub pages: usize,
    pub features: Vec<ShopRecord>,
}

impl ProcessedPage {
    fn empty() -> Self {
        Self {
            total: 0,
            pages: 1,
            features: Vec::new(),
        }
    }
}

/// Filters, ranks and paginates raw results.
///
/// Results without a name or location are dropped, then (optionally) those
/// that fail the relevance heuristic. Survivors are measured from the
/// origin, clipped to the radius, sorted nearest first (ties keep provider
/// order), filtered by type tags, and sliced to the requested page.
pub(crate) fn process_results(raw: Vec<RawPlaceResult>, opts: PageOptions<'_>) -> ProcessedPage {
    if raw.is_empty() {
        return ProcessedPage::empty();
    }

    let mut shops: Vec<ShopRecord> = raw
        .into_iter()
        .filter(|place| {
            place.name.as_deref().is_some_and(|n| !n.is_empty()) && place.location().is_some()
        })
        .filter(|place| !opts.apply_relevance || is_plant_related(place))
        .filter_map(|place| to_shop_record(place, opts.origin))
        .filter(|shop| within_radius(shop.distance_meters, opts.radius))
        .collect();

    // `sort_by_key` is stable, which gives the provider-order tie-break.
    shops.sort_by_key(|shop| shop.distance_meters);

    if let Some(wanted) = opts.types {
        shops.retain(|shop| {
            shop.types
                .iter()
                .any(|t| wanted.iter().any(|w| w.eq_ignore_ascii_case(t)))
        });
    }

    let total = shops.len();
    let pages = total.div_ceil(opts.limit.max(1)).max(1);
    let start = opts.page.saturating_sub(1).saturating_mul(opts.limit);
    let features = shops.into_iter().skip(start).take(opts.limit).collect();

    ProcessedPage {
        total,
        pages,
        features,
    }
}

fn to_shop_record(place: RawPlaceResult, origin: Coordinates) -> Option<ShopRecord> {
    let location = place.location()?;
    let is_open = place.open_now();
    let address = place.address().to_string();
    let distance = origin.distance_to(&Coordinates::new(location.lat, location.lng));

    Some(ShopRecord {
        id: place.place_id.clone(),
        name: place.name?,
        address,
        lat: location.lat,
        lng: location.lng,
        rating: place.rating,
        types: place.types.unwrap_or_default(),
        distance_meters: round_meters(distance),
        price_level: place.price_level,
        is_open,
        place_id: place.place_id,
    })
}

// Distances are finite, non-negative and below ~2.1e7 m.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_meters(distance: f64) -> u64 {
    distance.round() as u64
}

#[allow(clippy::cast_precision_loss)]
fn within_radius(distance_meters: u64, radius: f64) -> bool {
    distance_meters as f64 <= radius
}
