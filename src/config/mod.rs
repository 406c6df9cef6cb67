use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub admin_jwt_expiration_secs: u64,
    pub session_ttl_days: i64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    /// Accounts whose role can never be changed and which can never be
    /// deleted, regardless of who is asking.
    pub protected_user_ids: Vec<i64>,
    pub telegram_bot_token: Option<String>,
    pub telegram_default_channel: String,
    pub weather_api_key: Option<String>,
    pub weather_city: String,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_bucket: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let protected_user_ids = env::var("PROTECTED_USER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .collect();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            jwt_secret: env::var("JWT_SECRET")?,
            admin_jwt_expiration_secs: env::var("ADMIN_JWT_EXPIRATION")
                .ok()
                .and_then(|v| v.trim_end_matches('h').parse::<u64>().ok())
                .map(|h| h * 3600)
                .unwrap_or(3600),
            session_ttl_days: env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            protected_user_ids,
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|t| !t.is_empty()),
            telegram_default_channel: env::var("TELEGRAM_DEFAULT_CHANNEL")
                .unwrap_or_else(|_| "MotoTyumen".to_string()),
            weather_api_key: env::var("OPENWEATHER_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            weather_city: env::var("WEATHER_CITY").unwrap_or_else(|_| "Tyumen".to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ru-central1".to_string()),
            s3_access_key: env::var("S3_ACCESS_KEY_ID").ok(),
            s3_secret_key: env::var("S3_SECRET_ACCESS_KEY").ok(),
            s3_bucket: env::var("S3_BUCKET").unwrap_or_else(|_| "media".to_string()),
        })
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }

    pub fn admin_jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.admin_jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn is_protected_user(&self, user_id: i64) -> bool {
        self.protected_user_ids.contains(&user_id)
    }
}
