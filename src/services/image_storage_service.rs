use aws_sdk_s3 as s3;
use aws_sdk_s3::primitives::ByteStream;
use uuid::Uuid;

use crate::resource::IMAGE_DIRECTORY;

/// Builds a fresh object key under the product image directory.
pub fn new_image_key(extension: &str) -> String {
    format!("{}/{}.{}", IMAGE_DIRECTORY, Uuid::new_v4(), extension)
}

pub fn public_url(assets_url: &str, key: &str) -> String {
    format!("{}/{}", assets_url, key)
}

pub async fn put_object(
    client: &s3::Client,
    bucket: &str,
    key: &str,
    content_type: &str,
    body: Vec<u8>,
) -> Result<(), s3::Error> {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .body(ByteStream::from(body))
        .send()
        .await?;

    Ok(())
}

pub async fn delete_single_object(
    client: &s3::Client,
    bucket: &str,
    key: &str,
) -> Result<(), s3::Error> {
    client.delete_object().bucket(bucket).key(key).send().await?;

    Ok(())
}

/// Deletes every key, carrying on past failures. Returns the keys that could
/// not be removed.
pub async fn delete_objects(client: &s3::Client, bucket: &str, keys: &[String]) -> Vec<String> {
    let mut failed = Vec::new();

    for key in keys {
        if let Err(e) = delete_single_object(client, bucket, key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete stored image");
            failed.push(key.clone());
        }
    }

    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_live_under_the_products_directory() {
        let key = new_image_key("png");

        assert!(key.starts_with("products/"));
        assert!(key.ends_with(".png"));
        assert_ne!(key, new_image_key("png"));
    }

    #[tokio::test]
    async fn delete_objects_reports_every_failed_key() {
        let client = crate::config::offline_s3_client();
        let keys = vec!["products/a.png".to_string(), "products/b.jpg".to_string()];

        let failed = delete_objects(&client, "bucket", &keys).await;

        assert_eq!(failed, keys);
    }

    #[test]
    fn public_url_joins_base_and_key() {
        assert_eq!(
            public_url("https://cdn.example.com", "products/a.jpg"),
            "https://cdn.example.com/products/a.jpg"
        );
    }
}
