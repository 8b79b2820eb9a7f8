//! `Source` implementation over the Firestore REST API

use crate::auth::TokenProvider;
use crate::credentials::ServiceAccount;
use crate::errors::{FirestoreError, Result};
use crate::value::{parse_page, ListDocumentsResponse};
use async_trait::async_trait;
use fsbackfill_core::{BfError, Fetched, RowFailure, Source};
use reqwest::Url;
use std::future::Future;
use std::path::PathBuf;

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

/// Documents requested per list call
pub const PAGE_SIZE: u32 = 300;

#[derive(Debug, Clone)]
pub enum Credentials {
    ServiceAccountFile(PathBuf),
    /// Local emulator at `host:port`; no credentials are read
    Emulator { host: String },
}

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub credentials: Credentials,
}

pub struct FirestoreSource {
    http: reqwest::Client,
    base: Url,
    project_id: String,
    tokens: TokenProvider,
}

impl FirestoreSource {
    /// Build the client and prove the credentials work by acquiring a token
    pub async fn connect(settings: FirestoreSettings) -> Result<Self> {
        let http = reqwest::Client::new();
        let (base, tokens) = match &settings.credentials {
            Credentials::ServiceAccountFile(path) => {
                let account = ServiceAccount::from_file(path)?;
                (
                    parse_base(FIRESTORE_BASE)?,
                    TokenProvider::service_account(account).await?,
                )
            }
            Credentials::Emulator { host } => {
                (emulator_base(host)?, TokenProvider::emulator())
            }
        };

        tokens.token().await?;
        tracing::info!(
            component = "firestore",
            op = "connect",
            project_id = %settings.project_id,
            base = %base,
            "firestore source ready"
        );

        Ok(Self {
            http,
            base,
            project_id: settings.project_id,
            tokens,
        })
    }

    /// `documents.list` URL for one page of `collection`
    pub fn list_url(&self, collection: &str, page_token: Option<&str>) -> Result<Url> {
        list_url(&self.base, &self.project_id, collection, page_token)
    }

    async fn fetch_page(
        &self,
        collection: &str,
        page_token: Option<String>,
    ) -> Result<ListDocumentsResponse> {
        let url = self.list_url(collection, page_token.as_deref())?;
        let token = self.tokens.token().await?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FirestoreError::Status {
                collection: collection.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        parse_page(&body, collection)
    }
}

#[async_trait]
impl Source for FirestoreSource {
    async fn fetch_all(&self, collection: &str) -> fsbackfill_core::Result<Fetched> {
        collect_pages(|token| self.fetch_page(collection, token))
            .await
            .map_err(|e| BfError::from(e).with_op("fetch_all"))
    }
}

/// Follow `nextPageToken` until the listing is exhausted
///
/// A page that is not valid JSON fails the listing. A document on a valid
/// page that does not decode is kept as an undecodable entry.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Fetched>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListDocumentsResponse>>,
{
    let mut fetched = Fetched::default();
    let mut token = None;
    loop {
        let page = fetch_page(token.take()).await?;
        for doc in page.documents {
            let doc_id = doc.id().to_string();
            match doc.into_document() {
                Ok(document) => fetched.documents.push(document),
                Err(err) => fetched.undecodable.push(RowFailure {
                    doc_id,
                    error: BfError::from(err).with_op("decode_document"),
                }),
            }
        }
        match page.next_page_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(fetched),
        }
    }
}

fn list_url(base: &Url, project_id: &str, collection: &str, page_token: Option<&str>) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FirestoreError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend([
            "projects",
            project_id,
            "databases",
            "(default)",
            "documents",
            collection,
        ]);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("pageSize", &PAGE_SIZE.to_string());
        if let Some(token) = page_token {
            query.append_pair("pageToken", token);
        }
    }
    Ok(url)
}

fn parse_base(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| FirestoreError::InvalidEndpoint(format!("{raw}: {e}")))
}

fn emulator_base(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(FirestoreError::InvalidEndpoint(
            "FIRESTORE_EMULATOR_HOST is empty".to_string(),
        ));
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        parse_base(&format!("{host}/v1"))
    } else {
        parse_base(&format!("http://{host}/v1"))
    }
}
