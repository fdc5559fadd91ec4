use serde::Deserialize;

/// Main configuration structure for Plan-Ville
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub area: AreaConfig,
    #[serde(default)]
    pub grid: GridConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub cost: CostConfig,
    pub output: OutputConfig,
}

/// The circular area to cover
#[derive(Debug, Clone, Deserialize)]
pub struct AreaConfig {
    /// Latitude of the area center in degrees
    #[serde(rename = "center-lat")]
    pub center_lat: f64,

    /// Longitude of the area center in degrees
    #[serde(rename = "center-lng")]
    pub center_lng: f64,

    /// Radius of the area in kilometers
    #[serde(rename = "radius-km")]
    pub radius_km: f64,
}

/// Grid layout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// Distance between neighbouring search points (meters)
    #[serde(rename = "spacing-meters", default = "default_spacing")]
    pub spacing_meters: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spacing_meters: default_spacing(),
        }
    }
}

/// Provider query and pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Nearby-search endpoint URL
    pub endpoint: String,

    /// Query radius applied at every grid point (meters)
    #[serde(rename = "radius-meters", default = "default_search_radius")]
    pub radius_meters: u32,

    /// Fields requested from the provider
    #[serde(rename = "field-mask", default = "default_field_mask")]
    pub field_mask: String,

    /// Maximum provider calls in any rolling 60 second window
    #[serde(rename = "calls-per-minute", default = "default_calls_per_minute")]
    pub calls_per_minute: u32,

    /// Wait before requesting the next page with a continuation token (milliseconds)
    #[serde(rename = "page-cooldown-ms", default = "default_page_cooldown")]
    pub page_cooldown_ms: u64,

    /// Number of grid points dispatched together
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive batches (milliseconds)
    #[serde(rename = "batch-pause-ms", default = "default_batch_pause")]
    pub batch_pause_ms: u64,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Pre-flight cost estimation parameters
#[derive(Debug, Clone, Deserialize)]
pub struct CostConfig {
    /// Average number of pages fetched per point
    #[serde(rename = "avg-pages-per-point", default = "default_avg_pages")]
    pub avg_pages_per_point: f64,

    /// Provider price per 1000 calls
    #[serde(rename = "price-per-1000-calls", default = "default_price")]
    pub price_per_1000_calls: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            avg_pages_per_point: default_avg_pages(),
            price_per_1000_calls: default_price(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file (catalog, search ledger, runs)
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the JSON checkpoint file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,
}

fn default_spacing() -> f64 {
    200.0
}

fn default_search_radius() -> u32 {
    100
}

fn default_field_mask() -> String {
    "places.id,places.displayName,places.formattedAddress,places.location,places.primaryType,places.rating,places.userRatingCount".to_string()
}

fn default_calls_per_minute() -> u32 {
    300
}

fn default_page_cooldown() -> u64 {
    2000
}

fn default_batch_size() -> usize {
    50
}

fn default_batch_pause() -> u64 {
    1000
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_avg_pages() -> f64 {
    1.5
}

fn default_price() -> f64 {
    17.0
}
