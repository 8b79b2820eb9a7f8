//! Firestore REST source for the backfill runner
//!
//! Lists collections through `documents.list`, authenticating either with a
//! service-account key or against the local emulator.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod errors;
pub mod value;

pub use client::{collect_pages, Credentials, FirestoreSettings, FirestoreSource, PAGE_SIZE};
pub use credentials::ServiceAccount;
pub use errors::FirestoreError;
