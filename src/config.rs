use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com/search.json";
pub const DEFAULT_VISION_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Everything the service needs, resolved once at startup and handed to each
/// component. Nothing below `main` reads the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub shopping: ShoppingConfig,
    pub vision: VisionConfig,
    pub bind_addr: String,
    pub static_dir: String,
}

#[derive(Debug, Clone)]
pub struct ShoppingConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub country: String,
    pub language: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Config {
        dotenv().ok(); // Load .env file if present

        let timeout = Duration::from_secs(
            get_env_opt("PROVIDER_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        Config {
            shopping: ShoppingConfig {
                api_key: get_env_opt("SERPAPI_KEY"),
                base_url: get_env_or_default("SERPAPI_BASE_URL", DEFAULT_SERPAPI_BASE_URL),
                ..ShoppingConfig::with_timeout(timeout)
            },
            vision: VisionConfig {
                api_key: get_env_opt("VISION_API_KEY"),
                base_url: get_env_or_default("VISION_BASE_URL", DEFAULT_VISION_BASE_URL),
                model: get_env_or_default("VISION_MODEL", DEFAULT_VISION_MODEL),
                timeout,
            },
            bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:3000"),
            static_dir: get_env_or_default("STATIC_DIR", "static"),
        }
    }
}

impl ShoppingConfig {
    fn with_timeout(timeout: Duration) -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_SERPAPI_BASE_URL.to_string(),
            country: "us".to_string(),
            language: "en".to_string(),
            timeout,
        }
    }
}

impl Default for ShoppingConfig {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_VISION_BASE_URL.to_string(),
            model: DEFAULT_VISION_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Unset and blank values both count as "not configured".
fn get_env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_env_opt(key).unwrap_or_else(|| default.to_string())
}
