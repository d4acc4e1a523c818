//! JSON-over-HTTP catalog adapter.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `POST auth/login` → `{"auth_token": "..."}`
//! - `POST details/bulk` with `{"ids": [...]}` → `{"entries": [{"doc_id", "version_code"} | null]}`
//! - `GET packages/<id>?expansion_files=<bool>` → `{"doc_id", "data", "expansion_files": [...]}`
//!   with base64 payloads
//! - `GET search?q=<query>&n=<max>` → `{"results": [...]}`
//!
//! Every response is decoded into typed records at this boundary; a missing
//! field is a [`CatalogError::Decode`], never a silent default.

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use playsync_schema::{DownloadBundle, ExpansionFile, RemoteDetail, SearchResult};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Catalog, CatalogError, CatalogLogin, Credentials, DownloadOptions, check_parity};

const DEVICE_HEADER: &str = "X-Device-Codename";

/// Unauthenticated client bound to a device profile.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: Url,
    device_codename: String,
}

impl HttpCatalogClient {
    /// # Errors
    ///
    /// Returns [`CatalogError::Other`] if `base_url` is not an absolute URL.
    pub fn new(
        client: Client,
        base_url: &str,
        device_codename: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CatalogError::Other(format!("Invalid catalog URL '{base_url}': {e}")))?;
        Ok(Self {
            client,
            base_url,
            device_codename: device_codename.into(),
        })
    }

    /// Device profile sent with every request.
    pub fn device_codename(&self) -> &str {
        &self.device_codename
    }
}

/// Authenticated session returned by [`HttpCatalogClient::login`].
#[derive(Debug, Clone)]
pub struct HttpCatalogSession {
    client: Client,
    base_url: Url,
    device_codename: String,
    auth_token: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum LoginRequest<'a> {
    Password {
        email: &'a str,
        password: &'a str,
    },
    Token {
        token: &'a str,
        session_id: u64,
    },
}

#[derive(Deserialize)]
struct LoginResponse {
    auth_token: String,
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    ids: &'a [String],
}

#[derive(Deserialize)]
struct BulkResponse {
    entries: Vec<Option<BulkEntry>>,
}

#[derive(Deserialize)]
struct BulkEntry {
    doc_id: String,
    version_code: i64,
}

#[derive(Deserialize)]
struct DownloadResponse {
    doc_id: String,
    data: String,
    #[serde(default)]
    expansion_files: Vec<ExpansionEntry>,
}

#[derive(Deserialize)]
struct ExpansionEntry {
    #[serde(rename = "type")]
    kind: String,
    version_code: i64,
    data: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, CatalogError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| CatalogError::Other(format!("Catalog URL cannot be a base: {base}")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

async fn check_status(resp: Response) -> Result<Response, CatalogError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(CatalogError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, CatalogError> {
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| CatalogError::Decode(e.to_string()))
}

fn decode_base64(field: &str, data: &str) -> Result<Bytes, CatalogError> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map(Bytes::from)
        .map_err(|e| CatalogError::Decode(format!("{field}: {e}")))
}

#[async_trait]
impl CatalogLogin for HttpCatalogClient {
    type Session = HttpCatalogSession;

    async fn login(&self, credentials: &Credentials) -> Result<HttpCatalogSession, CatalogError> {
        let body = match credentials {
            Credentials::Password { email, password } => LoginRequest::Password { email, password },
            Credentials::Token(cred) => LoginRequest::Token {
                token: &cred.token,
                session_id: cred.session_id.value(),
            },
        };

        let resp = self
            .client
            .post(endpoint(&self.base_url, &["auth", "login"])?)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .header(DEVICE_HEADER, &self.device_codename)
            .json(&body)
            .send()
            .await?;

        if matches!(
            resp.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let message = resp.text().await.unwrap_or_default();
            return Err(CatalogError::LoginRejected(message));
        }
        let login: LoginResponse = decode(check_status(resp).await?).await?;
        if login.auth_token.is_empty() {
            return Err(CatalogError::MalformedResponse(
                "empty auth_token in login response".to_string(),
            ));
        }

        debug!(device = %self.device_codename, "Catalog login succeeded");
        Ok(HttpCatalogSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            device_codename: self.device_codename.clone(),
            auth_token: login.auth_token,
        })
    }
}

impl HttpCatalogSession {
    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(url))
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .header(DEVICE_HEADER, &self.device_codename)
            .bearer_auth(&self.auth_token)
    }
}

#[async_trait]
impl Catalog for HttpCatalogSession {
    async fn bulk_details(&self, identifiers: &[String]) -> Result<Vec<RemoteDetail>, CatalogError> {
        let resp = self
            .post(endpoint(&self.base_url, &["details", "bulk"])?)
            .json(&BulkRequest { ids: identifiers })
            .send()
            .await?;
        let bulk: BulkResponse = decode(check_status(resp).await?).await?;
        if bulk.entries.len() != identifiers.len() {
            return Err(CatalogError::MalformedResponse(format!(
                "bulk details returned {} entries for {} identifiers",
                bulk.entries.len(),
                identifiers.len()
            )));
        }

        let details: Vec<RemoteDetail> = bulk
            .entries
            .into_iter()
            .zip(identifiers)
            .map(|(entry, id)| match entry {
                Some(e) => RemoteDetail {
                    identifier: e.doc_id,
                    remote_version: e.version_code,
                },
                None => RemoteDetail::missing(id.clone()),
            })
            .collect();

        check_parity(identifiers, &details)?;
        Ok(details)
    }

    async fn download(
        &self,
        identifier: &str,
        options: DownloadOptions,
    ) -> Result<DownloadBundle, CatalogError> {
        let resp = self
            .get(endpoint(&self.base_url, &["packages", identifier])?)
            .query(&[("expansion_files", options.expansion_files)])
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(identifier.to_string()));
        }
        let payload: DownloadResponse = decode(check_status(resp).await?).await?;

        let primary = decode_base64("data", &payload.data)?;
        let expansion_files = payload
            .expansion_files
            .into_iter()
            .map(|f| {
                Ok(ExpansionFile {
                    data: decode_base64("expansion_files.data", &f.data)?,
                    kind: f.kind,
                    version_code: f.version_code,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Ok(DownloadBundle {
            doc_id: payload.doc_id,
            primary,
            expansion_files,
        })
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        let resp = self
            .get(endpoint(&self.base_url, &["search"])?)
            .query(&[("q", query.to_string()), ("n", max_results.to_string())])
            .send()
            .await?;
        let search: SearchResponse = decode(check_status(resp).await?).await?;
        Ok(search.results)
    }
}
