use crate::config::types::{AreaConfig, Config, CostConfig, GridConfig, OutputConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Largest covered radius accepted, in kilometers
pub const MAX_RADIUS_KM: f64 = 500.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_area_config(&config.area)?;
    validate_grid_config(&config.grid)?;
    validate_search_config(&config.search)?;
    validate_cost_config(&config.cost)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the covered area
fn validate_area_config(config: &AreaConfig) -> Result<(), ConfigError> {
    if !(-90.0..=90.0).contains(&config.center_lat) {
        return Err(ConfigError::Validation(format!(
            "center_lat must be between -90 and 90, got {}",
            config.center_lat
        )));
    }

    // Longitude degrees diverge near the poles
    if config.center_lat.abs() > 85.0 {
        return Err(ConfigError::Validation(format!(
            "center_lat must be within 85 degrees of the equator, got {}",
            config.center_lat
        )));
    }

    if !(-180.0..=180.0).contains(&config.center_lng) {
        return Err(ConfigError::Validation(format!(
            "center_lng must be between -180 and 180, got {}",
            config.center_lng
        )));
    }

    if !config.radius_km.is_finite() || config.radius_km < 0.0 {
        return Err(ConfigError::Validation(format!(
            "radius_km must be a non-negative number, got {}",
            config.radius_km
        )));
    }

    if config.radius_km > MAX_RADIUS_KM {
        return Err(ConfigError::Validation(format!(
            "radius_km must be at most {}, got {}",
            MAX_RADIUS_KM, config.radius_km
        )));
    }

    Ok(())
}

fn validate_grid_config(config: &GridConfig) -> Result<(), ConfigError> {
    if !config.spacing_meters.is_finite() || config.spacing_meters < 1.0 {
        return Err(ConfigError::Validation(format!(
            "spacing_meters must be >= 1, got {}",
            config.spacing_meters
        )));
    }
    Ok(())
}

/// Validates provider and pacing settings
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint must use http or https, got '{}'",
            endpoint.scheme()
        )));
    }

    if config.radius_meters < 1 || config.radius_meters > 50_000 {
        return Err(ConfigError::Validation(format!(
            "radius_meters must be between 1 and 50000, got {}",
            config.radius_meters
        )));
    }

    if config.calls_per_minute < 1 {
        return Err(ConfigError::Validation(format!(
            "calls_per_minute must be >= 1, got {}",
            config.calls_per_minute
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.field_mask.trim().is_empty() {
        return Err(ConfigError::Validation(
            "field_mask cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

fn validate_cost_config(config: &CostConfig) -> Result<(), ConfigError> {
    if !config.avg_pages_per_point.is_finite() || config.avg_pages_per_point < 1.0 {
        return Err(ConfigError::Validation(format!(
            "avg_pages_per_point must be >= 1, got {}",
            config.avg_pages_per_point
        )));
    }

    if !config.price_per_1000_calls.is_finite() || config.price_per_1000_calls < 0.0 {
        return Err(ConfigError::Validation(format!(
            "price_per_1000_calls must be >= 0, got {}",
            config.price_per_1000_calls
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            area: AreaConfig {
                center_lat: 40.7831,
                center_lng: -73.9712,
                radius_km: 5.0,
            },
            grid: GridConfig::default(),
            search: SearchConfig {
                endpoint: "https://places.googleapis.com/v1/places:searchNearby".to_string(),
                radius_meters: 100,
                field_mask: "places.id".to_string(),
                calls_per_minute: 300,
                page_cooldown_ms: 2000,
                batch_size: 50,
                batch_pause_ms: 1000,
                api_key_env: "GOOGLE_API_KEY".to_string(),
                request_timeout_secs: 30,
            },
            cost: CostConfig::default(),
            output: OutputConfig {
                database_path: "./businesses.db".to_string(),
                checkpoint_path: "./checkpoint.json".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_latitude_out_of_range() {
        let mut config = valid_config();
        config.area.center_lat = 91.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_polar_latitude_rejected() {
        let mut config = valid_config();
        config.area.center_lat = 89.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_negative_radius() {
        let mut config = valid_config();
        config.area.radius_km = -1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_radius_allowed() {
        let mut config = valid_config();
        config.area.radius_km = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_radius_upper_bound() {
        let mut config = valid_config();
        config.area.radius_km = MAX_RADIUS_KM;
        assert!(validate(&config).is_ok());

        config.area.radius_km = 501.0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_calls_per_minute() {
        let mut config = valid_config();
        config.search.calls_per_minute = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = valid_config();
        config.search.batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_endpoint() {
        let mut config = valid_config();
        config.search.endpoint = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_endpoint() {
        let mut config = valid_config();
        config.search.endpoint = "ftp://example.com/search".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_tiny_spacing() {
        let mut config = valid_config();
        config.grid.spacing_meters = 0.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_avg_pages_below_one() {
        let mut config = valid_config();
        config.cost.avg_pages_per_point = 0.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_checkpoint_path() {
        let mut config = valid_config();
        config.output.checkpoint_path = String::new();
        assert!(validate(&config).is_err());
    }
}
