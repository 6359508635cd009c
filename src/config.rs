use std::{env, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::util;

/// Flat disk configuration. With an empty `key` the client falls back to
/// whatever credentials the ambient AWS environment provides; a custom
/// `endpoint` switches to path-style addressing for S3-compatible services.
#[derive(Clone, Debug, Deserialize)]
pub struct DiskConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
    pub region: String,
    pub bucket: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
}

impl DiskConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Ok(serde_json::from_str(&contents)?)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            key: env::var("OSSDISK_KEY").unwrap_or_default(),
            secret: env::var("OSSDISK_SECRET").unwrap_or_default(),
            region: env::var("OSSDISK_REGION")
                .map_err(|_| ConfigError::MissingEnv("OSSDISK_REGION"))?,
            bucket: env::var("OSSDISK_BUCKET")
                .map_err(|_| ConfigError::MissingEnv("OSSDISK_BUCKET"))?,
            endpoint: env::var("OSSDISK_ENDPOINT").ok(),
        })
    }

    pub fn client(&self) -> aws_sdk_s3::Client {
        if self.key.is_empty() {
            let config = util::poll::poll_until_ready(aws_config::load_from_env());
            return aws_sdk_s3::Client::new(&config);
        }

        let credentials = aws_sdk_s3::config::Credentials::new(
            self.key.clone(),
            self.secret.clone(),
            None,
            None,
            "ossdisk",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(self.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        aws_sdk_s3::Client::from_conf(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: DiskConfig = serde_json::from_str(
            r#"{
                "key": "AKID",
                "secret": "shhh",
                "region": "oss-cn-hangzhou",
                "bucket": "assets",
                "endpoint": "https://oss-cn-hangzhou.example.com"
            }"#,
        )
        .expect("failed to parse config");

        assert_eq!(config.key, "AKID");
        assert_eq!(config.secret, "shhh");
        assert_eq!(config.region, "oss-cn-hangzhou");
        assert_eq!(config.bucket, "assets");
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://oss-cn-hangzhou.example.com")
        );
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: DiskConfig =
            serde_json::from_str(r#"{"region": "us-east-1", "bucket": "assets"}"#)
                .expect("failed to parse config");

        assert_eq!(config.key, "");
        assert_eq!(config.secret, "");
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_parse_rejects_missing_bucket() {
        let result = serde_json::from_str::<DiskConfig>(r#"{"region": "us-east-1"}"#);

        assert!(result.is_err());
    }
}
