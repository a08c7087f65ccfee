/// Client configuration from environment variables
///
/// Controls the backend endpoint, tracked blockchain and orchestrator policy.
/// Defaults target the public W3S sandbox on ETH-Sepolia.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.circle.com";
pub const DEFAULT_SDK_ENDPOINT: &str = "https://enduser-sdk.circle.com/v1/w3s";
pub const DEFAULT_BLOCKCHAIN: &str = "ETH-SEPOLIA";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Backend base URL (without the `/v1/w3s` prefix)
    pub api_base_url: String,
    /// Endpoint handed to the vendor SDK
    pub sdk_endpoint: String,
    /// Backend API key sent as bearer token
    pub api_key: String,
    /// Vendor SDK app id; the stored value wins when present
    pub app_id: String,
    /// Orchestrator policy and tracked chain
    pub orchestrator: OrchestratorConfig,
    /// Directory holding the persisted app id
    pub data_dir: PathBuf,
}

/// Policy knobs for the orchestrator
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub blockchain: String,
    pub page_size: u32,
    /// Delay between a successful challenge and the redirect to Home
    pub home_redirect_delay: Duration,
    /// Abort registration when user creation fails instead of ignoring it
    pub require_user_creation: bool,
    /// Offset used when rendering transaction timestamps
    pub display_utc_offset_hours: i32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            blockchain: DEFAULT_BLOCKCHAIN.to_string(),
            page_size: 10,
            home_redirect_delay: Duration::from_secs(3),
            require_user_creation: false,
            display_utc_offset_hours: 8,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `W3S_API_BASE_URL`: backend base URL (default `https://api.circle.com`)
    /// - `W3S_SDK_ENDPOINT`: endpoint for the vendor SDK
    /// - `W3S_API_KEY`, `W3S_APP_ID`: credentials (default empty)
    /// - `W3S_BLOCKCHAIN`: tracked chain (default `ETH-SEPOLIA`)
    /// - `W3S_PAGE_SIZE`: page size for list calls (default 10)
    /// - `W3S_HOME_REDIRECT_DELAY_MS`: post-challenge redirect delay (default 3000)
    /// - `W3S_REQUIRE_USER_CREATION`: `true` to abort registration on user creation failure
    /// - `W3S_DISPLAY_UTC_OFFSET_HOURS`: timestamp display offset (default 8)
    /// - `W3S_DATA_DIR`: directory for the stored app id (default `./w3s-data`)
    ///
    /// A `.env` file is loaded first when present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = OrchestratorConfig::default();

        let api_base_url =
            env::var("W3S_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        log::info!("Backend URL: {}", api_base_url);

        let sdk_endpoint =
            env::var("W3S_SDK_ENDPOINT").unwrap_or_else(|_| DEFAULT_SDK_ENDPOINT.to_string());

        let api_key = env::var("W3S_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            log::warn!("W3S_API_KEY not set, requests will be unauthenticated");
        }

        let blockchain =
            env::var("W3S_BLOCKCHAIN").unwrap_or_else(|_| DEFAULT_BLOCKCHAIN.to_string());

        let page_size = parse_var("W3S_PAGE_SIZE", defaults.page_size);
        let home_redirect_delay = Duration::from_millis(parse_var(
            "W3S_HOME_REDIRECT_DELAY_MS",
            defaults.home_redirect_delay.as_millis() as u64,
        ));
        let require_user_creation =
            parse_var("W3S_REQUIRE_USER_CREATION", defaults.require_user_creation);
        let display_utc_offset_hours = parse_var(
            "W3S_DISPLAY_UTC_OFFSET_HOURS",
            defaults.display_utc_offset_hours,
        );

        let data_dir = env::var("W3S_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./w3s-data"));

        Self {
            api_base_url,
            sdk_endpoint,
            api_key,
            app_id: env::var("W3S_APP_ID").unwrap_or_default(),
            orchestrator: OrchestratorConfig {
                blockchain,
                page_size,
                home_redirect_delay,
                require_user_creation,
                display_utc_offset_hours,
            },
            data_dir,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            sdk_endpoint: DEFAULT_SDK_ENDPOINT.to_string(),
            api_key: String::new(),
            app_id: String::new(),
            orchestrator: OrchestratorConfig::default(),
            data_dir: PathBuf::from("./w3s-data"),
        }
    }
}

fn parse_var<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Invalid {} '{}', using {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_sandbox() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "https://api.circle.com");
        assert_eq!(config.orchestrator.blockchain, "ETH-SEPOLIA");
        assert_eq!(config.orchestrator.page_size, 10);
    }

    #[test]
    fn test_default_policy_mirrors_sample_app() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.home_redirect_delay, Duration::from_secs(3));
        assert!(!config.require_user_creation);
        assert_eq!(config.display_utc_offset_hours, 8);
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        std::env::set_var("W3S_TEST_PAGE_SIZE_GARBAGE", "ten");
        assert_eq!(parse_var("W3S_TEST_PAGE_SIZE_GARBAGE", 10u32), 10);
        std::env::set_var("W3S_TEST_PAGE_SIZE_OK", " 25 ");
        assert_eq!(parse_var("W3S_TEST_PAGE_SIZE_OK", 10u32), 25);
    }
}
