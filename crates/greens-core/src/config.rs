use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
pub const DEFAULT_GEOCODE_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("GREENS_ENV", "development"))?;
    let bind_addr = parse_addr("GREENS_BIND_ADDR", "0.0.0.0:3001")?;
    let log_level = or_default("GREENS_LOG_LEVEL", "info");

    // A blank key is as good as no key; surface it as "not configured".
    let places_api_key = lookup("GOOGLE_MAPS_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    let places_base_url = or_default("GREENS_PLACES_BASE_URL", DEFAULT_PLACES_BASE_URL);
    let geocode_base_url = or_default("GREENS_GEOCODE_BASE_URL", DEFAULT_GEOCODE_BASE_URL);

    let places_timeout_secs = parse_u64("GREENS_PLACES_TIMEOUT_SECS", "30")?;
    if places_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "GREENS_PLACES_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let places_user_agent = or_default(
        "GREENS_PLACES_USER_AGENT",
        "greens/0.1 (plant-shop-search)",
    );

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        places_api_key,
        places_base_url,
        geocode_base_url,
        places_timeout_secs,
        places_user_agent,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GREENS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(
            parse_environment("development").unwrap(),
            Environment::Development
        );
        assert_eq!(parse_environment("test").unwrap(), Environment::Test);
        assert_eq!(
            parse_environment("production").unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn parse_environment_unknown_fails() {
        let err = parse_environment("producton").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "GREENS_ENV"));
    }

    #[test]
    fn build_app_config_applies_defaults_on_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3001");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.places_api_key.is_none());
        assert_eq!(cfg.places_base_url, DEFAULT_PLACES_BASE_URL);
        assert_eq!(cfg.geocode_base_url, DEFAULT_GEOCODE_BASE_URL);
        assert_eq!(cfg.places_timeout_secs, 30);
        assert_eq!(cfg.places_user_agent, "greens/0.1 (plant-shop-search)");
    }

    #[test]
    fn build_app_config_reads_api_key() {
        let mut map = HashMap::new();
        map.insert("GOOGLE_MAPS_API_KEY", "  AIza-test-key ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.places_api_key.as_deref(), Some("AIza-test-key"));
    }

    #[test]
    fn build_app_config_treats_blank_api_key_as_missing() {
        let mut map = HashMap::new();
        map.insert("GOOGLE_MAPS_API_KEY", "   ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.places_api_key.is_none());
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = HashMap::new();
        map.insert("GREENS_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GREENS_BIND_ADDR"),
            "expected InvalidEnvVar(GREENS_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_on_invalid_env() {
        let mut map = HashMap::new();
        map.insert("GREENS_ENV", "staging");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GREENS_ENV"),
            "expected InvalidEnvVar(GREENS_ENV), got: {result:?}"
        );
    }

    #[test]
    fn places_timeout_override_and_invalid() {
        let mut map = HashMap::new();
        map.insert("GREENS_PLACES_TIMEOUT_SECS", "5");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.places_timeout_secs, 5);

        map.insert("GREENS_PLACES_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GREENS_PLACES_TIMEOUT_SECS"),
            "expected InvalidEnvVar(GREENS_PLACES_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn places_timeout_zero_is_rejected() {
        let mut map = HashMap::new();
        map.insert("GREENS_PLACES_TIMEOUT_SECS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }

    #[test]
    fn base_urls_can_be_overridden() {
        let mut map = HashMap::new();
        map.insert("GREENS_PLACES_BASE_URL", "http://127.0.0.1:9000/place");
        map.insert("GREENS_GEOCODE_BASE_URL", "http://127.0.0.1:9000/geocode");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.places_base_url, "http://127.0.0.1:9000/place");
        assert_eq!(cfg.geocode_base_url, "http://127.0.0.1:9000/geocode");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut map = HashMap::new();
        map.insert("GOOGLE_MAPS_API_KEY", "super-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
