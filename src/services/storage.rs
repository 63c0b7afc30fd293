//! Cloud Storage blob store over the JSON API.
//!
//! Only five calls are needed, so the REST endpoints are used directly with
//! `reqwest` instead of a full SDK. Object names are pushed as single path
//! segments, which percent-encodes any `/` they contain, as the JSON API
//! requires.

use super::credentials::GoogleCredentials;
use super::BlobStore;
use crate::error::{JournalError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Uploads of multi-hundred-page scans can be slow on home connections.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// A single Cloud Storage bucket.
#[derive(Debug, Clone)]
pub struct GcsBlobStore {
    client: Client,
    endpoint: Url,
    bucket: String,
    credentials: GoogleCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectResource>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ObjectResource {
    name: String,
}

impl GcsBlobStore {
    pub fn new(bucket: impl Into<String>, credentials: GoogleCredentials) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, bucket, credentials)
    }

    /// Point at a non-default endpoint (e.g. a local storage emulator).
    pub fn with_endpoint(
        endpoint: &str,
        bucket: impl Into<String>,
        credentials: GoogleCredentials,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| JournalError::InvalidConfig(format!("storage endpoint: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| JournalError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            bucket: bucket.into(),
            credentials,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `<endpoint>/<root...>/b/<bucket>/o[/<object>]`
    fn object_url(&self, root: &[&str], object: Option<&str>) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| JournalError::InvalidConfig("storage endpoint cannot be a base".into()))?;
            segs.pop_if_empty();
            segs.extend(root);
            segs.extend(["b", self.bucket.as_str(), "o"]);
            if let Some(name) = object {
                segs.push(name);
            }
        }
        Ok(url)
    }

    async fn send(&self, object: &str, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        self.credentials
            .authorize(req)
            .send()
            .await
            .map_err(|e| JournalError::storage(object, e))
    }
}

/// Turn a non-success response into a storage error carrying the body.
async fn check(object: &str, resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(JournalError::storage(object, format!("HTTP {status}: {body}")))
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        let url = self.object_url(&["storage", "v1"], Some(name))?;
        let resp = self.send(name, self.client.get(url)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(name, resp).await?;
        Ok(true)
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let mut url = self.object_url(&["upload", "storage", "v1"], None)?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);
        debug!("Uploading {} bytes to gs://{}/{}", bytes.len(), self.bucket, name);

        let req = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        check(name, self.send(name, req).await?).await?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let url = self.object_url(&["storage", "v1"], Some(name))?;
        check(name, self.send(name, self.client.delete(url)).await?).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.object_url(&["storage", "v1"], None)?;
            {
                let mut q = url.query_pairs_mut();
                q.append_pair("prefix", prefix);
                if let Some(ref token) = page_token {
                    q.append_pair("pageToken", token);
                }
            }
            let resp = check(prefix, self.send(prefix, self.client.get(url)).await?).await?;
            let page: ListResponse = resp
                .json()
                .await
                .map_err(|e| JournalError::storage(prefix, e))?;

            names.extend(page.items.into_iter().map(|o| o.name));
            match page.next_page_token {
                Some(t) if !t.is_empty() => page_token = Some(t),
                _ => break,
            }
        }

        debug!("Listed {} objects under '{}'", names.len(), prefix);
        Ok(names)
    }

    async fn download_text(&self, name: &str) -> Result<String> {
        let mut url = self.object_url(&["storage", "v1"], Some(name))?;
        url.query_pairs_mut().append_pair("alt", "media");
        let resp = check(name, self.send(name, self.client.get(url)).await?).await?;
        resp.text().await.map_err(|e| JournalError::storage(name, e))
    }

    fn uri(&self, name: &str) -> String {
        format!("gs://{}/{}", self.bucket, name)
    }
}
