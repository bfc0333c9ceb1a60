//! Heuristic classification of provider results as plant businesses.

use crate::types::RawPlaceResult;

/// Name fragments that mark a place as plant related.
const PLANT_KEYWORDS: &[&str] = &[
    "plant",
    "nursery",
    "garden",
    "greenhouse",
    "botanical",
    "succulent",
    "flower",
    "flora",
    "green",
    "bloom",
];

/// Name/address fragments of businesses that are clearly not plant shops.
const EXCLUDE_KEYWORDS: &[&str] = &[
    "restaurant",
    "food",
    "bar",
    "pharmacy",
    "gas",
    "bank",
    "hotel",
    "hospital",
    "auto",
    "clothing",
    "electronics",
];

/// Whether a raw provider result looks like a plant-related business.
///
/// Florists always qualify; otherwise the lower-cased name must contain one
/// of [`PLANT_KEYWORDS`]. The exclude list is consulted last but every
/// remaining path answers `false`, so an exclude match never changes the
/// outcome.
#[must_use]
pub fn is_plant_related(place: &RawPlaceResult) -> bool {
    if place.types().iter().any(|t| t == "florist") {
        return true;
    }

    let name = place.name.as_deref().unwrap_or_default().to_lowercase();
    if PLANT_KEYWORDS.iter().any(|k| name.contains(k)) {
        return true;
    }

    let vicinity = place.vicinity.as_deref().unwrap_or_default().to_lowercase();
    if EXCLUDE_KEYWORDS
        .iter()
        .any(|k| name.contains(k) || vicinity.contains(k))
    {
        tracing::trace!(name = %name, "place matched exclude keyword");
        return false;
    }

    false
}
