//! Service-account key files

use crate::errors::{FirestoreError, Result};
use std::fmt;
use std::path::Path;
use yup_oauth2::ServiceAccountKey;

/// OAuth scope granting Firestore read access
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// A parsed Google service-account key
#[derive(Clone)]
pub struct ServiceAccount {
    key: ServiceAccountKey,
}

impl ServiceAccount {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            FirestoreError::ReadCredentials {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let key =
            yup_oauth2::parse_service_account_key(raw).map_err(FirestoreError::ParseCredentials)?;
        Ok(Self { key })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    pub fn into_key(self) -> ServiceAccountKey {
        self.key
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.key.client_email)
            .field("project_id", &self.key.project_id)
            .finish_non_exhaustive()
    }
}
