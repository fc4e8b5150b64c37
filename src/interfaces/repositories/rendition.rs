use std::time::Duration;

use async_trait::async_trait;

use crate::{
    delivery::url_builder::DeliveryUrlBuilder,
    entities::{image::ImageRecord, transformation::TransformationDescriptor},
    errors::ExportError,
};

#[async_trait]
pub trait RenditionSource: Send + Sync {
    /// Fetches the transformed bytes of one record.
    async fn fetch_rendition(
        &self,
        record: &ImageRecord,
        descriptor: &TransformationDescriptor,
    ) -> Result<Vec<u8>, ExportError>;
}

/// Fetches renditions straight from the hosted delivery service.
#[derive(Clone)]
pub struct HttpRenditionSource {
    client: reqwest::Client,
    urls: DeliveryUrlBuilder,
}

impl HttpRenditionSource {
    pub fn new(client: reqwest::Client, urls: DeliveryUrlBuilder) -> Self {
        HttpRenditionSource { client, urls }
    }

    pub fn with_timeout(urls: DeliveryUrlBuilder, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::new(client, urls))
    }

    pub fn urls(&self) -> &DeliveryUrlBuilder {
        &self.urls
    }
}

#[async_trait]
impl RenditionSource for HttpRenditionSource {
    async fn fetch_rendition(
        &self,
        record: &ImageRecord,
        descriptor: &TransformationDescriptor,
    ) -> Result<Vec<u8>, ExportError> {
        let url = self
            .urls
            .rendition_url(&record.id, descriptor)
            .map_err(|e| ExportError::DownloadFailed(format!("{}: {}", record.id, e)))?;

        tracing::debug!(record_id = %record.id, %url, "Fetching rendition");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExportError::DownloadFailed(format!("{}: {}", record.id, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::DownloadFailed(format!("{}: {}", record.id, e)))?;

        if !infer::is_image(&bytes) {
            return Err(ExportError::DownloadFailed(format!(
                "{}: delivery service returned a non-image body",
                record.id
            )));
        }

        Ok(bytes.to_vec())
    }
}
