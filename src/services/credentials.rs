//! Google Cloud credentials shared by the storage and vision clients.
//!
//! Minting OAuth tokens is outside this crate: the caller supplies a ready
//! access token (e.g. `gcloud auth print-access-token`). The service-account
//! file is still read so the project id can be attached to requests as the
//! quota/billing project.

use crate::error::{JournalError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Bearer token plus the project it bills to.
#[derive(Clone)]
pub struct GoogleCredentials {
    access_token: String,
    project_id: Option<String>,
}

#[derive(Deserialize)]
struct ServiceAccountFile {
    project_id: Option<String>,
}

impl GoogleCredentials {
    pub fn new(access_token: impl Into<String>, project_id: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            project_id,
        }
    }

    /// Read the project id from a service-account JSON key file.
    pub fn from_service_account_file(path: &Path, access_token: impl Into<String>) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JournalError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                JournalError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let parsed: ServiceAccountFile =
            serde_json::from_str(&raw).map_err(|e| JournalError::InvalidConfig(format!(
                "service account file '{}' is not valid JSON: {e}",
                path.display()
            )))?;
        Ok(Self::new(access_token, parsed.project_id))
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Attach bearer auth and, when known, the quota project header.
    pub(crate) fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.bearer_auth(&self.access_token);
        match self.project_id {
            Some(ref p) => req.header("x-goog-user-project", p),
            None => req,
        }
    }
}

impl fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleCredentials")
            .field("access_token", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}
