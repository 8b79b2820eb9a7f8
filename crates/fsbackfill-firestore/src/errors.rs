//! Error handling for the Firestore source
//!
//! Every variant converts into the core `BfError`; credential problems
//! surface as configuration or auth errors so the INIT diagnostic names the
//! source as the failed dependency.

use fsbackfill_core::errors::{BfError, BfErrorKind};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FirestoreError>;

#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("cannot read service account file {}: {source}", path.display())]
    ReadCredentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("service account file is not a valid key: {0}")]
    ParseCredentials(#[source] std::io::Error),

    #[error("service account private key is invalid: {0}")]
    InvalidKey(String),

    #[error("token request failed: {0}")]
    Token(#[from] yup_oauth2::Error),

    #[error("token endpoint returned no access token")]
    MissingToken,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Firestore returned {status} listing {collection}: {body}")]
    Status {
        collection: String,
        status: u16,
        body: String,
    },

    #[error("malformed document {document}: {reason}")]
    Decode { document: String, reason: String },

    #[error("invalid Firestore endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<FirestoreError> for BfError {
    fn from(err: FirestoreError) -> Self {
        let kind = match &err {
            FirestoreError::ReadCredentials { .. } => BfErrorKind::Io,
            FirestoreError::ParseCredentials(_)
            | FirestoreError::InvalidKey(_)
            | FirestoreError::InvalidEndpoint(_) => BfErrorKind::InvalidConfig,
            FirestoreError::Token(
                yup_oauth2::Error::HttpError(_) | yup_oauth2::Error::LowLevelError(_),
            ) => BfErrorKind::SourceUnavailable,
            FirestoreError::Token(_) | FirestoreError::MissingToken => BfErrorKind::Auth,
            FirestoreError::Status { status, .. } if *status == 401 || *status == 403 => {
                BfErrorKind::Auth
            }
            FirestoreError::Status { .. } | FirestoreError::Http(_) => {
                BfErrorKind::SourceUnavailable
            }
            FirestoreError::Decode { .. } => BfErrorKind::Serialization,
        };

        BfError::new(kind)
            .with_op("firestore")
            .with_message(err.to_string())
    }
}
