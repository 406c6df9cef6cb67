use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::config::Config;

const DEFAULT_ENDPOINT: &str = "https://storage.yandexcloud.net";

/// Media uploads go to one public-read bucket on an S3-compatible store.
#[derive(Clone)]
pub struct MediaStorage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl MediaStorage {
    pub async fn from_config(cfg: &Config) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.s3_region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);

        if let (Some(access), Some(secret)) = (&cfg.s3_access_key, &cfg.s3_secret_key) {
            builder = builder.credentials_provider(Credentials::new(
                access.clone(),
                secret.clone(),
                None,
                None,
                "media-storage-static",
            ));
        }

        let endpoint = cfg
            .s3_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);

        let public_base = format!("{}/{}", endpoint.trim_end_matches('/'), cfg.s3_bucket);

        Self {
            client: Client::from_conf(builder.build()),
            bucket: cfg.s3_bucket.clone(),
            public_base,
        }
    }

    pub async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!("{}/{}", self.public_base, key))
    }
}

/// `<folder>/<timestamp>_<hash>.<ext>` - timestamped so listings sort, hashed
/// so the same file re-uploaded twice does not collide with a different one.
pub fn object_key(folder: &str, file_name: &str, bytes: &[u8], now: DateTime<Utc>) -> String {
    let folder: String = folder
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let folder = if folder.is_empty() {
        "general".to_string()
    } else {
        folder
    };

    let digest = Sha256::digest(bytes);
    let hash: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();

    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("jpg");

    format!("{}/{}_{}.{}", folder, now.format("%Y%m%d_%H%M%S"), hash, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 25, 12, 30, 45).unwrap()
    }

    #[test]
    fn key_carries_folder_timestamp_and_extension() {
        let key = object_key("avatars", "me.png", b"data", fixed_now());
        assert!(key.starts_with("avatars/20251025_123045_"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn missing_extension_defaults_to_jpg() {
        let key = object_key("general", "upload", b"data", fixed_now());
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn hostile_folder_names_are_flattened() {
        let key = object_key("../secret", "a.png", b"data", fixed_now());
        assert!(key.starts_with("secret/"));
        let key = object_key("///", "a.png", b"data", fixed_now());
        assert!(key.starts_with("general/"));
    }

    #[test]
    fn same_content_same_hash() {
        let a = object_key("g", "a.png", b"data", fixed_now());
        let b = object_key("g", "b.png", b"data", fixed_now());
        let hash = |k: &str| k.rsplit_once('_').unwrap().1.to_string();
        assert_eq!(hash(&a), hash(&b));
        let c = object_key("g", "a.png", b"other", fixed_now());
        assert_ne!(hash(&a), hash(&c));
    }
}
