//! Place payloads and normalized place records
//!
//! The provider returns loosely shaped JSON where almost every field may be
//! absent or of an unexpected type. A page is decoded into [`SearchResponse`]
//! with each place kept as raw JSON, then every place is decoded and
//! normalized on its own into [`PlaceRecord`], which is what the catalog
//! stores. A malformed place is dropped without affecting its siblings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Sentinel used for textual fields the provider did not return
pub const UNKNOWN: &str = "unknown";

/// One page of a nearby search
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub places: Vec<Value>,

    /// Continuation token; present only when more results exist
    pub next_page_token: Option<String>,
}

impl SearchResponse {
    /// Returns the continuation token, treating an empty string as absent
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A place exactly as the provider describes it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacePayload {
    pub id: Option<String>,
    pub display_name: Option<LocalizedText>,
    pub formatted_address: Option<String>,
    pub location: Option<LatLng>,
    pub primary_type: Option<String>,
    pub rating: Option<f64>,
    pub user_rating_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LatLng {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A normalized catalog entry
///
/// `id` is the provider-assigned primary key. Text fields use [`UNKNOWN`]
/// when missing; numeric fields stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
}

impl PlaceRecord {
    /// Normalizes a provider payload
    ///
    /// Returns `None` when the payload carries no usable id, since such a
    /// place cannot be upserted.
    pub fn from_payload(payload: PlacePayload) -> Option<Self> {
        let id = payload.id.filter(|id| !id.trim().is_empty())?;
        let location = payload.location.unwrap_or_default();

        Some(Self {
            id,
            name: known_or_sentinel(payload.display_name.and_then(|name| name.text)),
            address: known_or_sentinel(payload.formatted_address),
            latitude: location.latitude,
            longitude: location.longitude,
            category: known_or_sentinel(payload.primary_type),
            rating: payload.rating,
            rating_count: payload.user_rating_count,
        })
    }

    /// Returns true if the record has real coordinates
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

fn known_or_sentinel(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Normalizes every place on a page
///
/// Places that fail to decode or carry no id are dropped with a warning.
pub fn normalize_page(response: SearchResponse) -> Vec<PlaceRecord> {
    let total = response.places.len();
    let mut records = Vec::with_capacity(total);

    for entry in response.places {
        match serde_json::from_value::<PlacePayload>(entry) {
            Ok(payload) => records.extend(PlaceRecord::from_payload(payload)),
            Err(e) => tracing::warn!("Dropping malformed place: {}", e),
        }
    }

    if records.len() < total {
        tracing::warn!(
            "Dropped {} of {} place(s) on a page",
            total - records.len(),
            total
        );
    }

    records
}
