use aws_config::{BehaviorVersion, Region, retry::RetryConfig};
use aws_sdk_s3::{Client as S3Client, config::Credentials};

use crate::{
    config::StorageConfig,
    error::{AppError, Result},
};

/// Builds the bucket client from the environment's static credentials and
/// the storage section of the config.
pub async fn load_s3_client(storage: &StorageConfig) -> Result<S3Client> {
    let access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .map_err(|_| AppError::ConfigError("AWS_ACCESS_KEY_ID not set".to_string()))?;
    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
        .map_err(|_| AppError::ConfigError("AWS_SECRET_ACCESS_KEY not set".to_string()))?;

    let shared = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(storage.region.clone()))
        .credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "product-admin-env",
        ))
        .load()
        .await;

    let mut builder = aws_sdk_s3::config::Builder::from(&shared);
    if let Some(endpoint) = &storage.endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    tracing::info!(
        bucket = %storage.bucket,
        region = %storage.region,
        custom_endpoint = storage.endpoint.is_some(),
        "S3 client initialized"
    );

    Ok(S3Client::from_conf(builder.build()))
}

/// Client with dummy credentials aimed at a closed local port and with
/// retries off, so any storage call fails at once. Lets tests wire a router
/// without the environment or the network.
pub fn offline_s3_client() -> S3Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .endpoint_url("http://127.0.0.1:1")
        .force_path_style(true)
        .retry_config(RetryConfig::disabled())
        .build();

    S3Client::from_conf(config)
}
