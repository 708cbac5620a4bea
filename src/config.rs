use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5050;
pub const DEFAULT_YGL_BASE_URL: &str = "https://www.yougotlistings.com/api";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 120;
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    /// Forwarded verbatim to the upstream. Empty when not configured.
    pub ygl_api_key: String,
    pub ygl_base_url: String,
    /// Empty means every origin is allowed (the request origin is mirrored).
    pub allowed_origins: Vec<String>,
    pub cache_ttl_secs: u64,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            environment: std::env::var("APP_ENV")
                .or_else(|_| std::env::var("NODE_ENV"))
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "development".to_string()),
            ygl_api_key: std::env::var("YGL_API_KEY")
                .map(|key| key.trim().to_string())
                .unwrap_or_default(),
            ygl_base_url: std::env::var("YGL_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map_or_else(
                    || Ok(DEFAULT_YGL_BASE_URL.to_string()),
                    |url| validate_base_url(&url),
                )?,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| DEFAULT_CACHE_TTL_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("CACHE_TTL_SECONDS must be a whole number"))?,
            static_dir: std::env::var("STATIC_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        };

        if config.ygl_api_key.is_empty() {
            tracing::warn!("YGL_API_KEY is not set; upstream requests will be rejected by YGL");
        }

        tracing::debug!("Environment: {}", config.environment);
        tracing::debug!("YGL Base URL: {}", config.ygl_base_url);
        tracing::debug!("Server Port: {}", config.port);
        if config.allowed_origins.is_empty() {
            tracing::info!("CORS: no ALLOWED_ORIGINS configured, mirroring request origin");
        } else {
            tracing::info!("CORS allowed origins: {:?}", config.allowed_origins);
        }

        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            ygl_api_key: String::new(),
            ygl_base_url: DEFAULT_YGL_BASE_URL.to_string(),
            allowed_origins: Vec::new(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            static_dir: DEFAULT_STATIC_DIR.to_string(),
        }
    }
}

fn validate_base_url(raw: &str) -> anyhow::Result<String> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| anyhow::anyhow!("YGL_BASE_URL is not a valid URL: {}", e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("YGL_BASE_URL must start with http:// or https://");
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
