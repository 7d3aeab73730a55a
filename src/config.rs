use std::env;

pub const DEFAULT_CATALOG_URL: &str = "https://www.e-food.nl/skin/basic/tilburg/bengels-tilburg";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub media_dir: String,
    pub host: String,
    pub port: u16,
    /// Prefix of the public URLs handed out for stored photos.
    pub public_base_url: String,
    pub catalog_url: String,
    // Shared passwords of the gated forms
    pub advice_password: String,
    pub status_password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "/data/media".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            catalog_url: env::var("CATALOG_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.into()),
            advice_password: required("ADVICE_PASSWORD")?,
            status_password: required("STATUS_PASSWORD")?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
