use std::time::Duration;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::StorageSettings;

pub const ORIGINAL_IMAGE_SUFFIX: &str = "original.jpg";
const PRESIGNED_URL_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to upload object {key}: {message}")]
    Upload { key: String, message: String },
    #[error("failed to presign object {key}: {message}")]
    Presign { key: String, message: String },
}

/// Users are stored under a hash of their id, never the raw id.
pub fn object_key_for(user_id: &str, suffix: &str) -> String {
    let hashed = hex::encode(Sha256::digest(user_id.as_bytes()));
    format!("users/{hashed}/{suffix}")
}

fn public_object_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}

#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
}

impl ObjectStorage {
    pub fn new(settings: &StorageSettings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key,
            &settings.secret_key,
            None,
            None,
            "skin-profile",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(settings.use_path_style);
        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint.trim_end_matches('/'));
        }

        info!(
            bucket = %settings.bucket,
            endpoint = ?settings.endpoint_url,
            region = %settings.region,
            path_style = settings.use_path_style,
            "Initializing object storage client"
        );

        ObjectStorage {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
            public_base_url: settings.public_base_url.clone(),
        }
    }

    /// Uploads the original selfie and returns a URL the caller can open.
    #[instrument(skip(self, image_bytes, user_id), fields(size = image_bytes.len()))]
    pub async fn upload_image(
        &self,
        image_bytes: Bytes,
        user_id: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key_for(user_id, ORIGINAL_IMAGE_SUFFIX);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .acl(ObjectCannedAcl::Private)
            .body(ByteStream::from(image_bytes))
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                error!(bucket = %self.bucket, key = %key, error = %message, "Failed to upload object");
                StorageError::Upload {
                    key: key.clone(),
                    message,
                }
            })?;

        if let Some(base_url) = &self.public_base_url {
            return Ok(public_object_url(base_url, &key));
        }

        let presigning =
            PresigningConfig::expires_in(PRESIGNED_URL_TTL).map_err(|err| StorageError::Presign {
                key: key.clone(),
                message: err.to_string(),
            })?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|err| StorageError::Presign {
                key: key.clone(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(request.uri().to_string())
    }
}
