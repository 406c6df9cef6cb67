use axum::Json;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: 0,
        msg: "success".into(),
        data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const ALREADY_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const METHOD_NOT_ALLOWED: i32 = 1006;
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Opaque session token, 32 random bytes base64url-encoded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// Claims for the legacy admin-panel JWT, minted after a successful panel
/// password check and accepted only by the legacy stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

pub fn generate_admin_token(config: &Config) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = AdminClaims {
        admin: true,
        exp: now + config.admin_jwt_expiration().as_secs() as i64,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_admin_token(token: &str, config: &Config) -> bool {
    decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.admin)
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            redis_url: String::new(),
            server_host: String::new(),
            server_port: 0,
            jwt_secret: "test-secret".into(),
            admin_jwt_expiration_secs: 3600,
            session_ttl_days: 30,
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            protected_user_ids: vec![1],
            telegram_bot_token: None,
            telegram_default_channel: "MotoTyumen".into(),
            weather_api_key: None,
            weather_city: "Tyumen".into(),
            s3_endpoint: None,
            s3_region: "ru-central1".into(),
            s3_access_key: None,
            s3_secret_key: None,
            s3_bucket: "media".into(),
        }
    }

    #[test]
    fn session_tokens_are_long_and_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 chars of unpadded base64url
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
    }

    #[test]
    fn password_hash_verifies() {
        let hashed = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hashed).unwrap());
        assert!(!verify_password("hunter23", &hashed).unwrap());
    }

    #[test]
    fn admin_token_round_trip() {
        let config = test_config();
        let token = generate_admin_token(&config).unwrap();
        assert!(verify_admin_token(&token, &config));
        assert!(!verify_admin_token("garbage", &config));

        let mut other = test_config();
        other.jwt_secret = "different".into();
        assert!(!verify_admin_token(&token, &other));
    }

    #[test]
    fn protected_user_lookup() {
        let config = test_config();
        assert!(config.is_protected_user(1));
        assert!(!config.is_protected_user(2));
    }
}
