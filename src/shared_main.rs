use std::env;

use clap::Args;

use crate::{
    constants::CART_DB,
    data_types::{Brand, ConfigError},
};

/// Sets up the timed logger for the library and for the calling binary
/// (`module` is usually `module_path!()`). Debug output only with `RUST_LOG=debug`.
pub fn logger_init(module: &str) {
    let level =
        if env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV).unwrap_or_default() == "debug"
        {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };

    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("leclerc_cart_rs", level)
        .filter_module(module, level)
        .init();
}

/// Backend and storage settings, shared by every binary.
#[derive(Args, Debug, Clone)]
pub struct AppConfig {
    /// Location the cart belongs to
    #[arg(long, env = "LOCATION_ID")]
    pub location_id: String,
    /// Base url of the cart/order backend{n}Example: <https://api.example.com>
    #[arg(long, env = "API_BASE_URL")]
    pub api_base_url: String,
    #[arg(long, env = "CRAVE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, env = "MARKETPLACE_ID", default_value = "")]
    pub marketplace_id: String,
    /// Publishable key handed to the payment form
    #[arg(long, env = "STRIPE_PUBLISHABLE_KEY")]
    pub stripe_publishable_key: Option<String>,
    #[arg(long, env = "BRAND", value_enum, default_value_t = Brand::Sushi)]
    pub brand: Brand,
    /// SQLite file holding the persisted cart
    #[arg(long, env = "CART_DB", default_value = CART_DB)]
    pub db_path: String,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location_id.trim().is_empty() {
            return Err(ConfigError::MissingLocationId);
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingApiBaseUrl);
        }

        Ok(())
    }

    /// Demo payments are only offered when no real payment form is configured.
    pub fn allow_demo_payments(&self) -> bool {
        self.stripe_publishable_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            location_id: "loc-1".to_string(),
            api_base_url: "https://api.example.com".to_string(),
            api_key: None,
            marketplace_id: String::new(),
            stripe_publishable_key: None,
            brand: Brand::Bakery,
            db_path: CART_DB.to_string(),
        }
    }

    #[test]
    fn test_validate() {
        assert_eq!(config().validate(), Ok(()));

        let blank = AppConfig {
            location_id: "  ".to_string(),
            ..config()
        };
        assert_eq!(blank.validate(), Err(ConfigError::MissingLocationId));

        let no_url = AppConfig {
            api_base_url: String::new(),
            ..config()
        };
        assert_eq!(no_url.validate(), Err(ConfigError::MissingApiBaseUrl));
    }

    #[test]
    fn test_demo_payments() {
        assert!(config().allow_demo_payments());

        let live = AppConfig {
            stripe_publishable_key: Some("pk_test_123".to_string()),
            ..config()
        };
        assert!(!live.allow_demo_payments());
    }
}
